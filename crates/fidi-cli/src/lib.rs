//! fidi CLI library
//!
//! This module contains the core CLI logic for the fidi tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Format};
pub use config::ConfigError;

use std::{
    fmt::Write as _,
    fs,
    io::{self, Read, Write},
    process::ExitCode,
};

use log::{info, warn};

use fidi::{
    Driver, ExecutionError, FidiError, LintReport, Mode, Outcome, RequestHandler, Status, Trace,
};

/// How a successfully processed unit turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Executed, or linted without errors.
    Clean,
    /// Linted with errors, rejected, or a node failed.
    Findings,
}

impl From<Completion> for ExitCode {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Clean => ExitCode::SUCCESS,
            Completion::Findings => ExitCode::FAILURE,
        }
    }
}

/// Run the fidi CLI application
///
/// Reads the input unit, processes it in the requested mode and writes the
/// result in the requested format.
///
/// # Errors
///
/// Returns `FidiError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax errors
/// - Execution errors that are not reported as findings
pub fn run(args: &Args) -> Result<Completion, FidiError> {
    info!(
        input_path = args.input,
        mode:% = args.mode,
        format:? = args.format;
        "Processing unit"
    );

    let mut config = config::load_config(args.config.as_ref())?;
    if args.strict {
        config = config.strict();
    }

    let source = read_source(args)?;

    let (output, completion) = match args.format {
        Format::Json => {
            let response = RequestHandler::new(config).handle(&source, args.mode);
            let json = response.to_json().map_err(io::Error::other)?;
            let completion = if response.status() == Status::Ok {
                Completion::Clean
            } else {
                Completion::Findings
            };
            (json + "\n", completion)
        }
        Format::Dot => {
            let mut driver = Driver::from_config(Mode::Lint, &config);
            let dot = driver
                .parse(&source)
                .map_err(|err| FidiError::new_syntax_error(err, source.as_str()))?
                .to_dot();
            if !driver.diagnostics().is_empty() {
                warn!(diagnostics = driver.diagnostics().len(); "Graph rendered despite diagnostics");
            }
            (dot, Completion::Clean)
        }
        Format::Text => {
            let mut driver = Driver::from_config(args.mode, &config);
            match driver.run(&source) {
                Ok(Outcome::Executed(trace)) => (render_trace(&trace), Completion::Clean),
                Ok(Outcome::Linted(report)) => render_report(&report, &source),
                Err(err @ FidiError::Execution(ExecutionError::Rejected { .. })) => {
                    let reportables = error_adapter::to_reportables(&err, &source);
                    (error_adapter::render(reportables), Completion::Findings)
                }
                Err(FidiError::Execution(ExecutionError::NodeFailed {
                    node,
                    message,
                    trace,
                })) => {
                    let mut out = render_trace(&trace);
                    let _ = writeln!(out, "failed at `{node}`: {message}");
                    (out, Completion::Findings)
                }
                Err(err) => return Err(err),
            }
        }
    };

    write_output(args, &output)?;
    info!(completion:?; "Unit processed");
    Ok(completion)
}

fn read_source(args: &Args) -> io::Result<String> {
    if args.reads_stdin() {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(&args.input)
    }
}

fn write_output(args: &Args, output: &str) -> io::Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, output)?;
            info!(output_file = path.as_str(); "Output written");
            Ok(())
        }
        None => io::stdout().lock().write_all(output.as_bytes()),
    }
}

fn render_trace(trace: &Trace) -> String {
    let mut out = String::new();
    for step in trace.steps() {
        let _ = writeln!(out, "{}", step.node());
        for stage in step.stages() {
            let calls: Vec<String> = stage
                .calls()
                .iter()
                .map(|call| {
                    let mut text = call.target().to_string();
                    if call.kind() != fidi_core::DEFAULT_EDGE_KIND {
                        let _ = write!(text, " [{}]", call.kind());
                    }
                    if call.repeat() > 1 {
                        let _ = write!(text, " x{}", call.repeat());
                    }
                    if let Some(address) = call.address() {
                        let _ = write!(text, " ({address})");
                    }
                    text
                })
                .collect();
            let _ = writeln!(out, "  stage {}: {}", stage.sequence(), calls.join(", "));
        }
    }
    let _ = write!(out, "response {}", trace.response());
    if let Some(healthy) = trace.healthy() {
        let _ = write!(out, " (healthy: {healthy})");
    }
    out.push('\n');
    out
}

fn render_report(report: &LintReport, source: &str) -> (String, Completion) {
    let mut out = error_adapter::render_diagnostics(report.diagnostics(), source);
    let _ = writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
    let completion = if report.has_errors() {
        Completion::Findings
    } else {
        Completion::Clean
    };
    (out, completion)
}
