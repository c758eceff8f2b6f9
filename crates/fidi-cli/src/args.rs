//! Command-line argument definitions for the fidi CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input, the processing mode, the
//! output format, configuration file selection, and logging verbosity.

use clap::{Parser, ValueEnum};

use fidi::Mode;

/// How results are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable trace or rendered diagnostics
    #[default]
    Text,
    /// The serialized response of the request handler
    Json,
    /// The parsed graph in Graphviz DOT
    Dot,
}

/// Command-line arguments for the fidi tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input fidi file, or `-` for standard input
    #[arg(help = "Path to the input file, or - for stdin")]
    pub input: String,

    /// Processing mode (app, lint)
    #[arg(short, long, default_value = "app")]
    pub mode: Mode,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Write results to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Treat the first syntax error as fatal
    #[arg(long)]
    pub strict: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Arguments for `input` with every option at its default.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            mode: Mode::default(),
            format: Format::default(),
            output: None,
            config: None,
            strict: false,
            log_level: "warn".to_string(),
        }
    }

    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}
