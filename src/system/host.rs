use color_eyre::Result;
use color_eyre::eyre::eyre;
use sysinfo::{MemoryRefreshKind, System};

use super::snapshot::{CpuUsage, MemoryUsage};

/// Source of host CPU and memory figures. An `Err` means the host cannot be monitored.
pub trait HostSource: Send {
    fn read_cpu(&mut self) -> Result<CpuUsage>;
    fn read_memory(&mut self) -> Result<MemoryUsage>;
}

pub struct HostMetricsReader {
    sys: System,
}

impl HostMetricsReader {
    /// Primes the CPU counters. Blocks once for `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` so
    /// the first reading covers a real window instead of reporting zero.
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        HostMetricsReader { sys }
    }
}

impl Default for HostMetricsReader {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource for HostMetricsReader {
    /// Utilization since the previous call; does not wait.
    fn read_cpu(&mut self) -> Result<CpuUsage> {
        self.sys.refresh_cpu_usage();
        if self.sys.cpus().is_empty() {
            return Err(eyre!("the operating system reported no processors"));
        }
        Ok(CpuUsage::new(self.sys.global_cpu_usage()))
    }

    fn read_memory(&mut self) -> Result<MemoryUsage> {
        self.sys
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(eyre!("the operating system reported zero total memory"));
        }
        Ok(MemoryUsage::from_total_and_available(
            total,
            self.sys.available_memory(),
        ))
    }
}
