use chrono::Utc;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use super::accelerator::{AcceleratorProbe, CommandRunner, ToolRunner};
use super::host::{HostMetricsReader, HostSource};
use super::snapshot::{Accelerator, Snapshot};
use crate::config::AcceleratorConfig;

/// Builds one [`Snapshot`] per tick from the host reader and the accelerator probe.
pub struct Collector<H = HostMetricsReader, R = CommandRunner> {
    host: H,
    probe: AcceleratorProbe<R>,
}

impl Collector {
    /// Wires the sysinfo reader and the `nvidia-smi` probe. Detection happens here, once.
    pub async fn from_config(accelerator: &AcceleratorConfig) -> Result<Self> {
        let host = tokio::task::spawn_blocking(HostMetricsReader::new)
            .await
            .wrap_err("host metrics reader failed to initialize")?;

        let probe_config = accelerator.probe_config();
        let probe = if accelerator.enabled {
            AcceleratorProbe::detect(CommandRunner, probe_config).await
        } else {
            tracing::info!("accelerator sampling disabled by configuration");
            AcceleratorProbe::disabled(CommandRunner, probe_config)
        };
        Ok(Collector::new(host, probe))
    }
}

impl<H: HostSource, R: ToolRunner> Collector<H, R> {
    pub fn new(host: H, probe: AcceleratorProbe<R>) -> Self {
        Collector { host, probe }
    }

    pub fn probe(&self) -> &AcceleratorProbe<R> {
        &self.probe
    }

    /// Host read failures are returned as-is; accelerator trouble only ever shows up in
    /// the snapshot's `accelerator` field.
    #[tracing::instrument(name = "collector.collect", level = "debug", skip_all)]
    pub async fn collect(&mut self) -> Result<Snapshot> {
        let cpu = self.host.read_cpu()?;
        let memory = self.host.read_memory()?;

        let accelerator = if self.probe.is_available() {
            self.probe.query_reading().await
        } else {
            Accelerator::Absent
        };

        Ok(Snapshot {
            timestamp: Utc::now(),
            cpu,
            memory,
            accelerator,
        })
    }
}
