//! Logging initialization using tracing.
//!
//! Diagnostics always go to stderr: stdout belongs to the check result.

use crate::CheckError;
use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Parse a log level (trace, debug, info, warn, error, or any `EnvFilter`
/// directive).
///
/// # Errors
///
/// Returns a [`CheckError::Config`] carrying the rejected level.
pub fn parse_level(level: &str) -> Result<EnvFilter, CheckError> {
    EnvFilter::try_new(level).map_err(|e| {
        CheckError::config_with_value(format!("invalid log level {level:?}: {e}"), level)
    })
}

/// Build the filter used for diagnostics.
///
/// `level` is always validated, so a bad setting is reported even when
/// `RUST_LOG` would have overridden it. A valid `RUST_LOG` wins.
pub fn log_filter(level: &str) -> Result<EnvFilter, CheckError> {
    let fallback = parse_level(level)?;
    Ok(EnvFilter::try_from_default_env().unwrap_or(fallback))
}

/// Install the tracing subscriber with `filter`, writing to stderr.
pub fn init_logging(filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()?;

    Ok(())
}
