//! Check configuration: thresholds, sampling interval and the optional RON
//! config file that supplies defaults for them.

use crate::{CheckError, CheckState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default warning threshold (percent).
pub const DEFAULT_WARNING: i64 = 80;
/// Default critical threshold (percent).
pub const DEFAULT_CRITICAL: i64 = 90;
/// Default sampling interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;
/// Default log filter when neither `RUST_LOG` nor a level is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Warning and critical thresholds.
///
/// Both are inclusive lower bounds. They are conceptually percentages, but the
/// range is not enforced: a threshold above 100 simply never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Values at or above this are at least `WARNING`
    pub warning: i64,
    /// Values at or above this are `CRITICAL`
    pub critical: i64,
}

impl Thresholds {
    #[must_use]
    pub const fn new(warning: i64, critical: i64) -> Self {
        Self { warning, critical }
    }

    /// Reject a warning threshold above the critical one.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.warning > self.critical {
            return Err(CheckError::config_with_value(
                format!(
                    "warning threshold ({}) cannot be greater than critical threshold ({})",
                    self.warning, self.critical
                ),
                self.warning.to_string(),
            ));
        }
        Ok(())
    }

    /// Classify a measured value.
    ///
    /// - `CRITICAL` if `value >= critical`
    /// - `WARNING` if `value >= warning`
    /// - `OK` otherwise
    #[must_use]
    pub fn classify(&self, value: f64) -> CheckState {
        if value >= self.critical as f64 {
            CheckState::Critical
        } else if value >= self.warning as f64 {
            CheckState::Warning
        } else {
            CheckState::Ok
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(DEFAULT_WARNING, DEFAULT_CRITICAL)
    }
}

/// Immutable configuration handed to a check once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    /// Classification thresholds
    pub thresholds: Thresholds,
    /// Time between the two samples
    pub interval: Duration,
}

impl CheckConfig {
    /// Minimum allowed sampling interval in seconds.
    pub const MIN_INTERVAL_SECS: u64 = 1;

    #[must_use]
    pub const fn new(thresholds: Thresholds, interval: Duration) -> Self {
        Self {
            thresholds,
            interval,
        }
    }

    /// Replace any value given on the command line or in the environment.
    #[must_use]
    pub fn apply_overrides(
        mut self,
        warning: Option<i64>,
        critical: Option<i64>,
        interval_secs: Option<u64>,
    ) -> Self {
        if let Some(warning) = warning {
            self.thresholds.warning = warning;
        }
        if let Some(critical) = critical {
            self.thresholds.critical = critical;
        }
        if let Some(secs) = interval_secs {
            self.interval = Duration::from_secs(secs);
        }
        self
    }

    /// Validate every invariant that must hold before sampling starts.
    pub fn validate(&self) -> Result<(), CheckError> {
        self.thresholds.validate()?;

        if self.interval < Duration::from_secs(Self::MIN_INTERVAL_SECS) {
            return Err(CheckError::config_with_value(
                format!(
                    "interval must be at least {} second(s)",
                    Self::MIN_INTERVAL_SECS
                ),
                self.interval.as_secs().to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::new(
            Thresholds::default(),
            Duration::from_secs(DEFAULT_INTERVAL_SECS),
        )
    }
}

/// Configuration loaded from `~/.config/<app>/config.ron`.
///
/// Every key is optional; command line flags and environment variables
/// override whatever is set here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Warning threshold (percent)
    pub warning: i64,
    /// Critical threshold (percent)
    pub critical: i64,
    /// Sampling interval in seconds
    pub interval: u64,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING,
            critical: DEFAULT_CRITICAL,
            interval: DEFAULT_INTERVAL_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_owned(),
        }
    }
}

impl FileConfig {
    const FILE_NAME: &'static str = "config.ron";

    /// Load configuration from the standard location for `app`.
    ///
    /// Searches for config in:
    /// 1. ~/.config/<app>/config.ron
    /// 2. ~/.<app>/config.ron (fallback)
    ///
    /// Returns default config if no file is found.
    pub fn load(app: &str) -> Result<Self, CheckError> {
        match Self::find_config_file(app) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, CheckError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckError::config_with_value(
                format!("failed to read config file: {e}"),
                path.display().to_string(),
            )
        })?;

        Self::parse(&content).map_err(|e| match e {
            CheckError::Config { message, .. } => {
                CheckError::config_with_value(message, path.display().to_string())
            }
            other => other,
        })
    }

    /// Parse configuration from RON text.
    ///
    /// `log_level` is validated here so a bad value is a configuration error.
    pub fn parse(content: &str) -> Result<Self, CheckError> {
        let config: Self = ron::from_str(content)
            .map_err(|e| CheckError::config(format!("failed to parse config file: {e}")))?;
        crate::logging::parse_level(&config.log_level)?;
        Ok(config)
    }

    /// Find the config file in standard locations.
    #[must_use]
    pub fn find_config_file(app: &str) -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join(app).join(Self::FILE_NAME);
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(format!(".{app}")).join(Self::FILE_NAME);
            if home_path.exists() {
                return Some(home_path);
            }
        }

        None
    }

    /// Get the default config file path for writing.
    #[must_use]
    pub fn default_config_path(app: &str) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app).join(Self::FILE_NAME))
    }

    /// Build the check configuration these settings describe.
    #[must_use]
    pub fn to_check_config(&self) -> CheckConfig {
        CheckConfig::new(
            Thresholds::new(self.warning, self.critical),
            Duration::from_secs(self.interval),
        )
    }

    /// Write a documented example configuration to `path`.
    pub fn save_example_config_to_file(path: &Path) -> Result<(), CheckError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"// CPU check configuration
// Command line flags and CPU_CHECK_* environment variables override these.

(
    // Busy percentage at or above which the check reports WARNING
    warning: {DEFAULT_WARNING},

    // Busy percentage at or above which the check reports CRITICAL
    // Must not be lower than `warning`
    critical: {DEFAULT_CRITICAL},

    // Seconds to wait between the two CPU counter samples (at least 1)
    interval: {DEFAULT_INTERVAL_SECS},

    // Log filter for stderr diagnostics when RUST_LOG is unset
    // Options: error, warn, info, debug, trace
    log_level: "{DEFAULT_LOG_LEVEL}",
)
"#
        );

        std::fs::write(path, template)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classify_inclusive_boundaries() {
        let thresholds = Thresholds::new(80, 90);

        assert_eq!(thresholds.classify(15.0), CheckState::Ok);
        assert_eq!(thresholds.classify(79.99), CheckState::Ok);
        assert_eq!(thresholds.classify(80.0), CheckState::Warning);
        assert_eq!(thresholds.classify(89.99), CheckState::Warning);
        assert_eq!(thresholds.classify(90.0), CheckState::Critical);
        assert_eq!(thresholds.classify(100.0), CheckState::Critical);
    }

    #[test]
    fn test_classify_is_monotone() {
        let thresholds = Thresholds::new(40, 60);
        let mut previous = CheckState::Ok;

        for step in 0..=1000 {
            let state = thresholds.classify(f64::from(step) / 10.0);
            assert!(state >= previous, "{state} after {previous} at {step}");
            previous = state;
        }
        assert_eq!(previous, CheckState::Critical);
    }

    #[test]
    fn test_equal_thresholds_go_straight_to_critical() {
        let thresholds = Thresholds::new(75, 75);
        assert!(thresholds.validate().is_ok());
        assert_eq!(thresholds.classify(74.9), CheckState::Ok);
        assert_eq!(thresholds.classify(75.0), CheckState::Critical);
    }

    #[test]
    fn test_warning_above_critical_is_rejected() {
        let err = Thresholds::new(90, 80).validate().unwrap_err();
        assert!(err.is_config());
        assert_eq!(
            err.to_string(),
            "warning threshold (90) cannot be greater than critical threshold (80)"
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = CheckConfig::new(Thresholds::default(), Duration::ZERO);
        assert!(config.validate().unwrap_err().is_config());

        assert!(CheckConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let config = FileConfig {
            warning: 50,
            critical: 70,
            interval: 5,
            ..FileConfig::default()
        }
        .to_check_config()
        .apply_overrides(Some(60), None, Some(2));

        assert_eq!(config.thresholds, Thresholds::new(60, 70));
        assert_eq!(config.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = FileConfig::parse("(critical: 95)").unwrap();
        assert_eq!(config.warning, DEFAULT_WARNING);
        assert_eq!(config.critical, 95);
        assert_eq!(config.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_invalid_log_level_is_a_config_error() {
        let err = FileConfig::parse(r#"(log_level: "=")"#).unwrap_err();

        assert!(err.is_config());
        assert_eq!(err.state(), CheckState::Warning);
    }

    #[test]
    fn test_unknown_key_is_a_config_error() {
        let err = FileConfig::parse("(warnign: 10)").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "(warning: 70, critical: 85, interval: 3)").unwrap();

        let config = FileConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.to_check_config().thresholds, Thresholds::new(70, 85));
        assert_eq!(config.interval, 3);
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load_from_file(&dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(err, CheckError::Config { value: Some(_), .. }));
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ron");

        FileConfig::save_example_config_to_file(&path).unwrap();
        assert_eq!(FileConfig::load_from_file(&path).unwrap(), FileConfig::default());
    }
}
