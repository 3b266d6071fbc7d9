#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use hostpulse::system::accelerator::{AcceleratorProbe, ProbeConfig, ToolOutput, ToolRunner};
use hostpulse::system::collector::Collector;
use hostpulse::system::host::HostSource;
use hostpulse::system::snapshot::{CpuUsage, MemoryUsage};

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Host with fixed readings that starts failing after `healthy_reads` CPU reads.
pub struct FakeHost {
    pub cpu_percent: f32,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub healthy_reads: Option<usize>,
    reads: usize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            cpu_percent: 37.2,
            total_bytes: 16 * GIB,
            available_bytes: 10 * GIB,
            healthy_reads: None,
            reads: 0,
        }
    }

    pub fn failing_after(healthy_reads: usize) -> Self {
        Self {
            healthy_reads: Some(healthy_reads),
            ..Self::new()
        }
    }
}

impl HostSource for FakeHost {
    fn read_cpu(&mut self) -> Result<CpuUsage> {
        self.reads += 1;
        if let Some(limit) = self.healthy_reads
            && self.reads > limit
        {
            return Err(eyre!("processor counters vanished"));
        }
        Ok(CpuUsage::new(self.cpu_percent))
    }

    fn read_memory(&mut self) -> Result<MemoryUsage> {
        Ok(MemoryUsage::from_total_and_available(
            self.total_bytes,
            self.available_bytes,
        ))
    }
}

#[derive(Clone, Default)]
pub struct RunnerStats {
    pub detections: Arc<AtomicUsize>,
    pub queries: Arc<AtomicUsize>,
    pub in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl RunnerStats {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stand-in for the management tool. `query_delays[n]` is how long query `n` takes; the
/// last entry repeats.
#[derive(Clone)]
pub struct FakeRunner {
    pub installed: bool,
    pub query_stdout: Option<String>,
    pub query_delays: Vec<Duration>,
    pub stats: RunnerStats,
}

impl FakeRunner {
    pub fn installed(stdout: &str) -> Self {
        Self {
            installed: true,
            query_stdout: Some(stdout.to_string()),
            query_delays: vec![Duration::ZERO],
            stats: RunnerStats::default(),
        }
    }

    pub fn missing() -> Self {
        Self {
            installed: false,
            query_stdout: None,
            query_delays: vec![Duration::ZERO],
            stats: RunnerStats::default(),
        }
    }

    /// Detection succeeds but every query fails to launch.
    pub fn broken_after_detection() -> Self {
        Self {
            installed: true,
            query_stdout: None,
            query_delays: vec![Duration::ZERO],
            stats: RunnerStats::default(),
        }
    }

    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.query_delays = delays;
        self
    }
}

impl ToolRunner for FakeRunner {
    async fn run(
        &self,
        _program: &str,
        args: &[&str],
        _capture_stdout: bool,
        _suppress_console_window: bool,
    ) -> io::Result<ToolOutput> {
        if args.is_empty() {
            self.stats.detections.fetch_add(1, Ordering::SeqCst);
            return if self.installed {
                Ok(ToolOutput {
                    exit_code: Some(0),
                    stdout: String::new(),
                })
            } else {
                Err(io::Error::new(io::ErrorKind::NotFound, "program not found"))
            };
        }

        let call = self.stats.queries.fetch_add(1, Ordering::SeqCst);
        let current = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(self.stats.in_flight.clone());

        let delay = self
            .query_delays
            .get(call)
            .or(self.query_delays.last())
            .copied()
            .unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match &self.query_stdout {
            Some(stdout) => Ok(ToolOutput {
                exit_code: Some(0),
                stdout: stdout.clone(),
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "program not found")),
        }
    }
}

pub fn probe_config(timeout: Duration) -> ProbeConfig {
    ProbeConfig {
        program: "nvidia-smi".to_string(),
        timeout,
        suppress_console_window: true,
    }
}

pub async fn collector(host: FakeHost, runner: FakeRunner) -> Collector<FakeHost, FakeRunner> {
    let probe = AcceleratorProbe::detect(runner, probe_config(Duration::from_secs(60))).await;
    Collector::new(host, probe)
}
