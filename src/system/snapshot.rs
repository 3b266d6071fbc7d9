use chrono::{DateTime, Utc};
use serde::Serialize;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Everything captured during one tick. Superseded by the next tick's snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Capture time; serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuUsage,
    pub memory: MemoryUsage,
    pub accelerator: Accelerator,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuUsage {
    pub used_percent: f32,
}

impl CpuUsage {
    /// Clamps the sample into `[0, 100]` so the derived free share stays in range too.
    pub fn new(used_percent: f32) -> Self {
        let used_percent = if used_percent.is_finite() {
            used_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { used_percent }
    }

    pub fn free_percent(&self) -> f32 {
        100.0 - self.used_percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Memory available for new allocations, reclaimable caches included.
    pub free_bytes: u64,
}

impl MemoryUsage {
    /// Builds a reading from the OS total and available figures; `used` is derived so
    /// that `used + free == total` always holds.
    pub fn from_total_and_available(total_bytes: u64, available_bytes: u64) -> Self {
        let free_bytes = available_bytes.min(total_bytes);
        Self {
            total_bytes,
            used_bytes: total_bytes - free_bytes,
            free_bytes,
        }
    }

    pub fn used_ratio(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.used_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Accelerator {
    Present(AcceleratorInfo),
    /// Management tool not installed, not reachable, or it reported no device.
    Absent,
    /// Management tool present but the query failed.
    Error { message: String },
}

impl Accelerator {
    pub fn error(message: impl Into<String>) -> Self {
        Accelerator::Error {
            message: message.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Accelerator::Present(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceleratorInfo {
    pub name: String,
    pub memory_total_mib: f64,
    pub memory_used_mib: f64,
    pub load_percent: f64,
}

impl AcceleratorInfo {
    pub fn memory_total_bytes(&self) -> u64 {
        mib_to_bytes(self.memory_total_mib)
    }

    pub fn memory_used_bytes(&self) -> u64 {
        mib_to_bytes(self.memory_used_mib)
    }

    pub fn free_load_percent(&self) -> f64 {
        100.0 - self.load_percent
    }
}

fn mib_to_bytes(mib: f64) -> u64 {
    if mib.is_finite() && mib > 0.0 {
        (mib * BYTES_PER_MIB).round() as u64
    } else {
        0
    }
}
