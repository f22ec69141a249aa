//! CPU usage check for Sensu-style monitoring agents.
//!
//! Reads the machine-wide CPU time counters from `/proc/stat` twice, derives
//! per-category utilization over the interval and classifies the busy
//! percentage against warning and critical thresholds.
//!
//! # Examples
//!
//! ```rust
//! use sensu_go_cpu_check::{CpuCategory, CpuStats, UsageSnapshot};
//!
//! let earlier = CpuStats { user: 100, system: 50, idle: 850, ..CpuStats::default() };
//! let later = CpuStats { user: 110, system: 55, idle: 935, ..CpuStats::default() };
//!
//! let usage = UsageSnapshot::between(&earlier, &later, 4)?;
//! assert_eq!(usage.get(CpuCategory::User), 10.0);
//! assert_eq!(usage.busy(), 15.0);
//! # Ok::<(), sensu_check_core::CheckError>(())
//! ```

pub mod check;
pub mod cpu;
pub mod usage;

pub use check::{CpuCheck, CHECK_NAME};
pub use cpu::{CpuCategory, CpuStats, CpuTimes, PerCoreCpuStats, ProcStat};
pub use usage::{utilization, UsageSnapshot};
