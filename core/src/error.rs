//! Error types shared by every check.

use crate::CheckState;

/// Common error types for check operations.
///
/// [`CheckError::Config`] is the only pre-flight failure: it is raised while
/// validating arguments, before anything is measured. Every other variant is a
/// failure to obtain a measurement and is reported as [`CheckState::Unknown`].
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// I/O error occurred while reading system counters.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing counter data from text format.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (invalid thresholds, bad config file, etc.).
    #[error("{message}")]
    Config {
        /// Description of the configuration issue
        message: String,
        /// The invalid configuration value if applicable
        value: Option<String>,
    },

    /// The measured resource is not available on this system.
    #[error("Unavailable: {reason}")]
    Unavailable {
        /// Reason why the resource is unavailable
        reason: String,
    },

    /// Permission denied accessing system counters.
    #[error("Permission denied: {resource}")]
    PermissionDenied {
        /// The resource that couldn't be accessed
        resource: String,
    },

    /// Counter values that cannot produce a measurement.
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Description of what makes the data invalid
        message: String,
        /// The invalid data if it can be safely displayed
        data: Option<String>,
    },
}

impl CheckError {
    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            value: None,
        }
    }

    /// Create a new configuration error with the invalid value.
    pub fn config_with_value<S: Into<String>, V: Into<String>>(message: S, value: V) -> Self {
        Self::Config {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a new permission denied error.
    pub fn permission_denied<S: Into<String>>(resource: S) -> Self {
        Self::PermissionDenied {
            resource: resource.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: None,
        }
    }

    /// Create a new invalid data error with the problematic data.
    pub fn invalid_data_with_value<S: Into<String>, D: Into<String>>(message: S, data: D) -> Self {
        Self::InvalidData {
            message: message.into(),
            data: Some(data.into()),
        }
    }

    /// Whether this error was raised by configuration validation.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// The check state this error is reported with.
    #[must_use]
    pub const fn state(&self) -> CheckState {
        if self.is_config() {
            CheckState::Warning
        } else {
            CheckState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_error_constructors() {
        let err = CheckError::parse("Invalid format");
        assert!(matches!(err, CheckError::Parse { .. }));

        let err = CheckError::config_with_value("Invalid setting", "bad_value");
        assert!(matches!(err, CheckError::Config { value: Some(_), .. }));

        let err = CheckError::invalid_data_with_value("Counters went backwards", "cpu 1 2 3 4");
        assert!(matches!(err, CheckError::InvalidData { data: Some(_), .. }));
    }

    #[test]
    fn test_config_errors_are_warnings() {
        let err = CheckError::config("warning above critical");
        assert!(err.is_config());
        assert_eq!(err.state(), CheckState::Warning);
        assert_eq!(err.to_string(), "warning above critical");
    }

    #[test]
    fn test_sampling_errors_are_unknown() {
        let errors = [
            CheckError::unavailable("/proc/stat does not exist"),
            CheckError::permission_denied("/proc/stat"),
            CheckError::invalid_data("counters did not advance"),
            CheckError::Io(std::io::Error::other("boom")),
        ];

        for err in errors {
            assert!(!err.is_config());
            assert_eq!(err.state(), CheckState::Unknown);
        }
    }
}
