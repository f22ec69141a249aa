//! Utilization derived from two counter readings.

use crate::cpu::{CpuCategory, CpuStats};
use sensu_check_core::{CheckError, Metric};
use std::fmt::Write;
use tracing::{debug, warn};

/// Per-category utilization over one sampling interval.
///
/// Every percentage lies in `[0, 100]`. Each one is clamped on its own, so the
/// busy percentage is not forced to equal `100 - idle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSnapshot {
    /// Indexed like [`CpuCategory::ALL`]
    percentages: [f64; CpuCategory::COUNT],
    cores: usize,
}

/// Counter growth of the whole machine between two readings.
///
/// Fails instead of dividing by zero when the counters did not advance, and
/// when they went backwards (counter reset or overflow).
fn total_delta(earlier: &CpuStats, later: &CpuStats) -> Result<f64, CheckError> {
    let (before, after) = (earlier.total(), later.total());

    if after == before {
        return Err(CheckError::invalid_data(
            "CPU time counters did not advance between samples",
        ));
    }
    if after < before {
        return Err(CheckError::invalid_data_with_value(
            "CPU time counters went backwards between samples",
            format!("{before} -> {after}"),
        ));
    }

    Ok((after - before) as f64)
}

fn percentage(category: CpuCategory, earlier: &CpuStats, later: &CpuStats, total: f64) -> f64 {
    let (before, after) = (earlier.get(category), later.get(category));
    let Some(delta) = after.checked_sub(before) else {
        warn!(category = category.name(), before, after, "cpu counter went backwards, clamping to 0");
        return 0.0;
    };
    (delta as f64 * 100.0 / total).clamp(0.0, 100.0)
}

/// Share of CPU time spent in `category` between two readings, in percent.
///
/// # Errors
///
/// Returns a [`CheckError::InvalidData`] if the total counter did not grow.
pub fn utilization(
    category: CpuCategory,
    earlier: &CpuStats,
    later: &CpuStats,
) -> Result<f64, CheckError> {
    let total = total_delta(earlier, later)?;
    Ok(percentage(category, earlier, later, total))
}

impl UsageSnapshot {
    /// Compute every category's utilization between two readings.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError::InvalidData`] if the total counter did not grow,
    /// or if `cores` is zero.
    pub fn between(earlier: &CpuStats, later: &CpuStats, cores: usize) -> Result<Self, CheckError> {
        if cores == 0 {
            return Err(CheckError::invalid_data("Core count must be at least 1"));
        }

        let total = total_delta(earlier, later)?;
        debug!(total_delta = total, "computing cpu utilization");

        let percentages = CpuCategory::ALL.map(|category| percentage(category, earlier, later, total));

        Ok(Self { percentages, cores })
    }

    /// Utilization of one category, in percent.
    #[must_use]
    pub fn get(&self, category: CpuCategory) -> f64 {
        self.percentages[category as usize]
    }

    /// Number of logical cores.
    #[must_use]
    pub const fn cores(&self) -> usize {
        self.cores
    }

    /// Sum of every non-idle category.
    #[must_use]
    pub fn busy(&self) -> f64 {
        self.iter()
            .filter(|(category, _)| category.is_busy())
            .map(|(_, value)| value)
            .sum()
    }

    /// Categories with their utilization, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (CpuCategory, f64)> + '_ {
        CpuCategory::ALL.iter().copied().zip(self.percentages.iter().copied())
    }

    /// Performance metrics, `cpu_<category>` then `cpu_cores`.
    #[must_use]
    pub fn metrics(&self) -> Vec<Metric> {
        self.iter()
            .map(|(category, value)| Metric::percentage(format!("cpu_{}", category.name()), value))
            .chain(std::iter::once(Metric::count("cpu_cores", self.cores)))
            .collect()
    }

    /// Render the report line.
    ///
    /// ```text
    /// idle=95.32% user=2.10% ... steal=0.00% | cpu_idle=95.32 ... cpu_steal=0.00 cpu_cores=4
    /// ```
    #[must_use]
    pub fn format_line(&self) -> String {
        let mut line = String::new();

        for (category, value) in self.iter() {
            if !line.is_empty() {
                line.push(' ');
            }
            // Writing to a String cannot fail.
            let _ = write!(line, "{}={value:.2}%", category.name());
        }

        line.push_str(" |");
        for metric in self.metrics() {
            let _ = write!(line, " {metric}");
        }

        line
    }
}
