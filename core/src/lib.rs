//! # sensu-check-core
//!
//! Shared building blocks for single-shot monitoring checks: the check state
//! and its exit code, threshold classification, configuration loading, the
//! one-line result format and the runner that ties them together.
//!
//! ## Quick Start
//!
//! ```rust
//! use sensu_check_core::{Check, CheckError, CheckOutput, CheckState};
//!
//! struct AlwaysOk;
//!
//! impl Check for AlwaysOk {
//!     fn name(&self) -> &str {
//!         "always-ok"
//!     }
//!
//!     fn check_args(&self) -> Result<(), CheckError> {
//!         Ok(())
//!     }
//!
//!     async fn execute(&mut self) -> Result<CheckOutput, CheckError> {
//!         Ok(CheckOutput::new(self.name(), CheckState::Ok, "all good"))
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CheckConfig, FileConfig, Thresholds};
pub use error::CheckError;
pub use logging::{init_logging, log_filter};

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use tracing::{error, info, warn};

/// Result state of a check, in increasing order of severity.
///
/// The discriminants are the process exit codes monitoring agents expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckState {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    /// The check could not produce a measurement
    Unknown = 3,
}

impl CheckState {
    /// Process exit code for this state.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// A single `name=value` performance metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Decimal places used in text output
    #[serde(skip)]
    pub precision: usize,
}

impl Metric {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, precision: usize) -> Self {
        Self {
            name: name.into(),
            value,
            precision,
        }
    }

    /// A percentage metric, printed with two decimals.
    #[must_use]
    pub fn percentage(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, 2)
    }

    /// An integral metric, printed without decimals.
    #[must_use]
    pub fn count(name: impl Into<String>, value: usize) -> Self {
        Self::new(name, value as f64, 0)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.*}", self.name, self.precision, self.value)
    }
}

/// The result of one check execution.
///
/// Renders as `<check> <STATE>: <text>`.
///
/// # Examples
///
/// ```rust
/// use sensu_check_core::{CheckOutput, CheckState, Metric};
///
/// let output = CheckOutput::new("disk-check", CheckState::Warning, "used=85.00% | disk_used=85.00")
///     .with_metrics(vec![Metric::percentage("disk_used", 85.0)]);
///
/// assert_eq!(output.to_string(), "disk-check WARNING: used=85.00% | disk_used=85.00");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutput {
    /// Name of the check that produced this output
    pub check: String,
    /// Classified state
    #[serde(rename = "status")]
    pub state: CheckState,
    /// Human readable report, including any perfdata suffix
    pub text: String,
    /// Structured copy of the metrics contained in `text`
    pub metrics: Vec<Metric>,
}

impl CheckOutput {
    #[must_use]
    pub fn new(check: impl Into<String>, state: CheckState, text: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            state,
            text: text.into(),
            metrics: Vec::new(),
        }
    }

    /// Attach structured metrics to this output.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Display for CheckOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.check, self.state, self.text)
    }
}

/// How the runner prints results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line of text (the format monitoring agents parse)
    #[default]
    Text,
    /// One JSON object per run
    Json,
}

impl OutputFormat {
    /// Render a successful check result.
    #[must_use]
    pub fn render(self, output: &CheckOutput) -> String {
        match self {
            Self::Text => output.to_string(),
            Self::Json => serde_json::json!({
                "check": output.check,
                "status": output.state,
                "exit_code": output.state.exit_code(),
                "text": output.text,
                "metrics": output.metrics,
            })
            .to_string(),
        }
    }

    /// Render a failed validation or execution.
    ///
    /// Text failures carry no `<check> <STATE>:` prefix, so consumers parsing
    /// metrics never mistake them for a measurement.
    #[must_use]
    pub fn render_failure(self, check: &str, context: &str, err: &CheckError) -> String {
        match self {
            Self::Text => format!("{context}: {err}"),
            Self::Json => serde_json::json!({
                "check": check,
                "status": err.state(),
                "exit_code": err.state().exit_code(),
                "error": format!("{context}: {err}"),
            })
            .to_string(),
        }
    }
}

/// A single-shot check.
///
/// The runner calls [`Check::check_args`] first and only calls
/// [`Check::execute`] when it succeeds.
#[allow(async_fn_in_trait)]
pub trait Check {
    /// Name printed in front of every result.
    fn name(&self) -> &str;

    /// Validate configuration before anything is measured.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::Config`] describing the invalid input.
    fn check_args(&self) -> Result<(), CheckError>;

    /// Take the measurement and classify it.
    ///
    /// # Errors
    ///
    /// Returns an error if no complete measurement could be taken.
    async fn execute(&mut self) -> Result<CheckOutput, CheckError>;
}

/// Validate, execute and print one check, returning the state to exit with.
///
/// # Errors
///
/// Only fails if writing to `out` fails.
pub async fn run_check<C, W>(check: &mut C, format: OutputFormat, out: &mut W) -> io::Result<CheckState>
where
    C: Check,
    W: Write,
{
    if let Err(err) = check.check_args() {
        warn!(check = check.name(), error = %err, "input validation failed");
        writeln!(out, "{}", format.render_failure(check.name(), "error validating input", &err))?;
        return Ok(err.state());
    }

    match check.execute().await {
        Ok(output) => {
            info!(check = check.name(), state = %output.state, "check completed");
            writeln!(out, "{}", format.render(&output))?;
            Ok(output.state)
        }
        Err(err) => {
            error!(check = check.name(), error = %err, "check execution failed");
            writeln!(out, "{}", format.render_failure(check.name(), "error executing check", &err))?;
            Ok(err.state())
        }
    }
}
