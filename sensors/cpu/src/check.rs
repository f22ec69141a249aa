//! The CPU check: two samples, one classification, one line of output.

use crate::cpu::{CpuTimes, ProcStat};
use crate::usage::UsageSnapshot;
use sensu_check_core::{Check, CheckConfig, CheckError, CheckOutput};
use tracing::{debug, info};

/// Name printed in front of every result.
pub const CHECK_NAME: &str = "sensu-go-cpu-check";

/// Classifies machine-wide CPU busy time against warning/critical thresholds.
///
/// # Examples
///
/// ```rust,no_run
/// use sensu_check_core::{run_check, CheckConfig, OutputFormat};
/// use sensu_go_cpu_check::CpuCheck;
///
/// # async fn demo() -> std::io::Result<()> {
/// let mut check = CpuCheck::new(CheckConfig::default());
/// let state = run_check(&mut check, OutputFormat::Text, &mut std::io::stdout()).await?;
/// std::process::exit(state.exit_code());
/// # }
/// ```
#[derive(Debug)]
pub struct CpuCheck<S = ProcStat> {
    config: CheckConfig,
    source: S,
}

impl CpuCheck<ProcStat> {
    /// Create a check reading `/proc/stat`.
    #[must_use]
    pub fn new(config: CheckConfig) -> Self {
        Self::with_source(config, ProcStat::new())
    }
}

impl<S: CpuTimes> CpuCheck<S> {
    /// Create a check reading counters from `source`.
    #[must_use]
    pub const fn with_source(config: CheckConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Sample twice, `interval` apart, and compute utilization.
    async fn measure(&mut self) -> Result<UsageSnapshot, CheckError> {
        let earlier = self.source.snapshot()?;
        debug!(interval = ?self.config.interval, "sleeping between samples");
        tokio::time::sleep(self.config.interval).await;
        let later = self.source.snapshot()?;

        let cores = self.source.core_count()?;
        UsageSnapshot::between(&earlier, &later, cores)
    }
}

impl<S: CpuTimes> Check for CpuCheck<S> {
    fn name(&self) -> &str {
        CHECK_NAME
    }

    fn check_args(&self) -> Result<(), CheckError> {
        self.config.validate()
    }

    async fn execute(&mut self) -> Result<CheckOutput, CheckError> {
        let usage = self.measure().await?;
        let busy = usage.busy();
        let state = self.config.thresholds.classify(busy);

        info!(
            busy,
            warning = self.config.thresholds.warning,
            critical = self.config.thresholds.critical,
            %state,
            "classified cpu usage"
        );

        Ok(CheckOutput::new(CHECK_NAME, state, usage.format_line()).with_metrics(usage.metrics()))
    }
}
