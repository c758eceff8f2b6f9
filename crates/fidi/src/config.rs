//! Configuration for parsing, execution and linting.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the command-line front end. Every field has a default, so
//! an empty file (or no file at all) yields [`AppConfig::default`].
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`ParserSection`] - Error recovery budget of the parser.
//! - [`AppSection`] - Execution options for the `app` mode.
//! - [`LintSection`] - Checks enabled in the `lint` mode.
//!
//! # Example
//!
//! ```
//! # use fidi::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.parser().max_recoveries(), 16);
//! assert!(!config.app().allow_cycles());
//! ```

use serde::Deserialize;

use fidi_parser::ParserConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    parser: ParserSection,

    #[serde(default)]
    app: AppSection,

    #[serde(default)]
    lint: LintSection,
}

impl AppConfig {
    pub fn new(parser: ParserSection, app: AppSection, lint: LintSection) -> Self {
        Self { parser, app, lint }
    }

    pub fn parser(&self) -> &ParserSection {
        &self.parser
    }

    pub fn app(&self) -> &AppSection {
        &self.app
    }

    pub fn lint(&self) -> &LintSection {
        &self.lint
    }

    /// Disable error recovery: the first syntax or lexical error is fatal.
    pub fn strict(mut self) -> Self {
        self.parser.max_recoveries = 0;
        self
    }
}

/// `[parser]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserSection {
    /// Recovery attempts per unit before a syntax error becomes fatal.
    /// Zero disables recovery.
    #[serde(default = "default_max_recoveries")]
    max_recoveries: usize,
}

fn default_max_recoveries() -> usize {
    ParserConfig::DEFAULT_MAX_RECOVERIES
}

impl ParserSection {
    pub fn new(max_recoveries: usize) -> Self {
        Self { max_recoveries }
    }

    pub fn max_recoveries(&self) -> usize {
        self.max_recoveries
    }

    /// The settings handed to [`fidi_parser::Parser`].
    pub fn to_parser_config(&self) -> ParserConfig {
        ParserConfig::new(self.max_recoveries)
    }
}

impl Default for ParserSection {
    fn default() -> Self {
        Self::new(default_max_recoveries())
    }
}

/// `[app]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    /// Execute cyclic graphs by ignoring the edges that close each cycle.
    #[serde(default)]
    allow_cycles: bool,

    /// Upper bound in milliseconds for a scheduled unit, including its
    /// delays. Unset means no limit.
    #[serde(default)]
    timeout_ms: Option<u64>,

    /// Every node must be reachable through a `url`, or `hostname` and
    /// `port`. Checked in both modes.
    #[serde(default)]
    require_address: bool,
}

impl AppSection {
    pub fn new(allow_cycles: bool, timeout_ms: Option<u64>) -> Self {
        Self {
            allow_cycles,
            timeout_ms,
            require_address: false,
        }
    }

    pub fn with_require_address(mut self, require_address: bool) -> Self {
        self.require_address = require_address;
        self
    }

    pub fn allow_cycles(&self) -> bool {
        self.allow_cycles
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    pub fn require_address(&self) -> bool {
        self.require_address
    }
}

/// `[lint]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LintSection {
    /// Warn about nodes without any edge.
    #[serde(default)]
    unused_nodes: bool,

    /// Lint edge payloads as nested units.
    #[serde(default = "default_true")]
    payloads: bool,

    /// Deepest payload nesting that is still linted.
    #[serde(default = "default_max_payload_depth")]
    max_payload_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_payload_depth() -> usize {
    8
}

impl LintSection {
    pub fn new(unused_nodes: bool, payloads: bool, max_payload_depth: usize) -> Self {
        Self {
            unused_nodes,
            payloads,
            max_payload_depth,
        }
    }

    pub fn unused_nodes(&self) -> bool {
        self.unused_nodes
    }

    pub fn payloads(&self) -> bool {
        self.payloads
    }

    pub fn max_payload_depth(&self) -> usize {
        self.max_payload_depth
    }
}

impl Default for LintSection {
    fn default() -> Self {
        Self::new(false, true, default_max_payload_depth())
    }
}
