//! CPU time-accounting counters.
//!
//! This module reads the cumulative counters Linux exposes in `/proc/stat`.
//! A single reading is meaningless on its own; [`crate::usage`] turns two
//! readings into utilization percentages.

use sensu_check_core::CheckError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A CPU time-accounting category.
///
/// Declaration order is report order, so `category as usize` indexes
/// [`CpuCategory::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuCategory {
    Idle,
    User,
    System,
    Iowait,
    Nice,
    Irq,
    Softirq,
    Steal,
}

impl CpuCategory {
    /// Number of categories.
    pub const COUNT: usize = 8;

    /// Every category, in the order they are reported.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::User,
        Self::System,
        Self::Iowait,
        Self::Nice,
        Self::Irq,
        Self::Softirq,
        Self::Steal,
    ];

    /// Lowercase name used in the report and in metric keys.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::User => "user",
            Self::System => "system",
            Self::Iowait => "iowait",
            Self::Nice => "nice",
            Self::Irq => "irq",
            Self::Softirq => "softirq",
            Self::Steal => "steal",
        }
    }

    /// Whether time in this category counts towards the busy percentage.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// CPU statistics from `/proc/stat`.
///
/// Cumulative time per category since boot, in "jiffies" (clock ticks).
/// The unit cancels out when two readings are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuStats {
    /// Time spent in user mode (normal processes)
    pub user: u64,
    /// Time spent in user mode with low priority (nice)
    pub nice: u64,
    /// Time spent in system mode (kernel)
    pub system: u64,
    /// Time spent idle
    pub idle: u64,
    /// Time waiting for I/O to complete
    pub iowait: u64,
    /// Time servicing hardware interrupts
    pub irq: u64,
    /// Time servicing software interrupts
    pub softirq: u64,
    /// Time stolen by virtualization
    pub steal: u64,
}

impl CpuStats {
    /// Counter value for one category.
    #[must_use]
    pub const fn get(&self, category: CpuCategory) -> u64 {
        match category {
            CpuCategory::Idle => self.idle,
            CpuCategory::User => self.user,
            CpuCategory::System => self.system,
            CpuCategory::Iowait => self.iowait,
            CpuCategory::Nice => self.nice,
            CpuCategory::Irq => self.irq,
            CpuCategory::Softirq => self.softirq,
            CpuCategory::Steal => self.steal,
        }
    }

    /// Total CPU time across all categories.
    ///
    /// Summed as `u128` so counters near `u64::MAX` cannot overflow.
    #[must_use]
    pub const fn total(&self) -> u128 {
        self.user as u128
            + self.nice as u128
            + self.system as u128
            + self.idle as u128
            + self.iowait as u128
            + self.irq as u128
            + self.softirq as u128
            + self.steal as u128
    }

    /// Parse the aggregate `cpu ` line out of `/proc/stat` content.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::Parse`] if there is no aggregate line or it is
    /// malformed.
    pub fn parse_proc_stat(content: &str) -> Result<Self, CheckError> {
        let line = content
            .lines()
            .find(|line| line.starts_with("cpu "))
            .ok_or_else(|| CheckError::parse("No aggregate cpu line in /proc/stat"))?;

        Self::parse_from_proc_stat_line(line)
    }

    /// Parse CPU statistics from a `/proc/stat` line.
    ///
    /// Kernels older than 2.6.11 report fewer columns; missing trailing
    /// columns read as zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::Parse`] if the line format is invalid or
    /// contains non-numeric values.
    pub fn parse_from_proc_stat_line(line: &str) -> Result<Self, CheckError> {
        if !line.starts_with("cpu") {
            return Err(CheckError::parse("Line does not start with 'cpu'"));
        }

        let values: Result<Vec<u64>, _> = line
            .split_whitespace()
            .skip(1) // Skip "cpu" or "cpuN"
            .take(8)
            .map(str::parse)
            .collect();

        let values = values.map_err(|e| {
            CheckError::parse_with_source("Failed to parse CPU statistics", e)
        })?;

        if values.len() < 4 {
            return Err(CheckError::parse(format!(
                "Insufficient CPU statistics: expected at least 4, got {}",
                values.len()
            )));
        }

        Ok(Self {
            user: values[0],
            nice: values[1],
            system: values[2],
            idle: values[3],
            iowait: values.get(4).copied().unwrap_or(0),
            irq: values.get(5).copied().unwrap_or(0),
            softirq: values.get(6).copied().unwrap_or(0),
            steal: values.get(7).copied().unwrap_or(0),
        })
    }
}

/// Per-core CPU statistics.
#[derive(Debug, Clone)]
pub struct PerCoreCpuStats {
    /// Core number (0-based)
    pub core_id: usize,
    /// CPU statistics for this core
    pub stats: CpuStats,
}

impl PerCoreCpuStats {
    /// Parse per-core CPU statistics from a `/proc/stat` line.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::Parse`] if the line format is invalid or
    /// doesn't represent a CPU core.
    pub fn parse_from_proc_stat_line(line: &str) -> Result<Self, CheckError> {
        if !line.starts_with("cpu") || line.starts_with("cpu ") {
            return Err(CheckError::parse("Line is not a CPU core line"));
        }

        let core_id = line
            .split_whitespace()
            .next()
            .and_then(|label| label.strip_prefix("cpu"))
            .ok_or_else(|| CheckError::parse("Invalid CPU line format"))?
            .parse::<usize>()
            .map_err(|e| CheckError::parse_with_source("Failed to parse core ID", e))?;

        let stats = CpuStats::parse_from_proc_stat_line(line)?;

        Ok(Self { core_id, stats })
    }

    /// Parse every per-core line out of `/proc/stat` content.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::Parse`] if a `cpuN` line is malformed.
    pub fn parse_proc_stat(content: &str) -> Result<Vec<Self>, CheckError> {
        content
            .lines()
            .filter(|line| line.starts_with("cpu") && !line.starts_with("cpu "))
            .map(Self::parse_from_proc_stat_line)
            .collect()
    }
}

/// A source of cumulative CPU time counters.
pub trait CpuTimes {
    /// Read the current machine-wide counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the counters cannot be read. Implementations must
    /// not substitute a zeroed sample.
    fn snapshot(&mut self) -> Result<CpuStats, CheckError>;

    /// Number of logical cores.
    ///
    /// # Errors
    ///
    /// Returns an error if the per-core breakdown cannot be read or is empty.
    fn core_count(&mut self) -> Result<usize, CheckError>;
}

/// Counters read from `/proc/stat`.
#[derive(Debug, Clone)]
pub struct ProcStat {
    path: PathBuf,
}

impl ProcStat {
    /// Path to the proc stat file.
    pub const PATH: &'static str = "/proc/stat";

    #[must_use]
    pub fn new() -> Self {
        Self::with_path(Self::PATH)
    }

    /// Read counters from a specific path (useful for testing).
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, CheckError> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CheckError::unavailable(format!(
                "{} does not exist (not a Linux system?)",
                self.path.display()
            )),
            io::ErrorKind::PermissionDenied => {
                CheckError::permission_denied(self.path.display().to_string())
            }
            _ => CheckError::Io(e),
        })
    }

    /// Verify the counters can be read and parsed.
    ///
    /// # Errors
    ///
    /// Returns the error a real check run would fail with.
    pub fn check_availability(&self) -> Result<(), CheckError> {
        let content = self.read()?;
        CpuStats::parse_proc_stat(&content)?;
        Ok(())
    }
}

impl Default for ProcStat {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTimes for ProcStat {
    fn snapshot(&mut self) -> Result<CpuStats, CheckError> {
        let stats = CpuStats::parse_proc_stat(&self.read()?)?;
        debug!(path = %self.path.display(), ?stats, "sampled cpu counters");
        Ok(stats)
    }

    fn core_count(&mut self) -> Result<usize, CheckError> {
        let cores = PerCoreCpuStats::parse_proc_stat(&self.read()?)?;
        if cores.is_empty() {
            return Err(CheckError::invalid_data(format!(
                "No per-core cpu lines in {}",
                self.path.display()
            )));
        }
        debug!(cores = cores.len(), "counted cpu cores");
        Ok(cores.len())
    }
}
