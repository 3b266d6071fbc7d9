use std::io::Write;

use color_eyre::Result;

use crate::format::{clock_time, format_bytes, format_mib, format_percent};
use crate::scheduler::SnapshotSink;
use crate::system::snapshot::{Accelerator, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Text,
    Json,
}

/// Writes one line per snapshot, for use without a terminal UI.
pub struct PrintSink<W> {
    out: W,
    format: LineFormat,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W, format: LineFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        match self.format {
            LineFormat::Text => writeln!(self.out, "{}", summary_line(snapshot))?,
            LineFormat::Json => {
                serde_json::to_writer(&mut self.out, snapshot)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send + 'static> SnapshotSink for PrintSink<W> {
    fn on_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.write_snapshot(&snapshot)
    }
}

pub fn summary_line(snapshot: &Snapshot) -> String {
    let accelerator = match &snapshot.accelerator {
        Accelerator::Present(info) => format!(
            "gpu {} load {} mem {}/{}",
            info.name,
            format_percent(info.load_percent),
            format_mib(info.memory_used_mib),
            format_mib(info.memory_total_mib)
        ),
        Accelerator::Absent => "gpu not found".to_string(),
        Accelerator::Error { message } => format!("gpu error: {message}"),
    };
    format!(
        "{} cpu {} used mem {}/{} ({} free) {}",
        clock_time(snapshot.timestamp),
        format_percent(snapshot.cpu.used_percent as f64),
        format_bytes(snapshot.memory.used_bytes),
        format_bytes(snapshot.memory.total_bytes),
        format_bytes(snapshot.memory.free_bytes),
        accelerator
    )
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone, Utc};

    use super::*;
    use crate::system::snapshot::{AcceleratorInfo, CpuUsage, MemoryUsage};

    const GIB: u64 = 1024 * 1024 * 1024;

    fn snapshot(accelerator: Accelerator) -> Snapshot {
        Snapshot {
            timestamp: Local
                .with_ymd_and_hms(2026, 7, 14, 10, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
            cpu: CpuUsage::new(37.2),
            memory: MemoryUsage::from_total_and_available(16 * GIB, 12 * GIB),
            accelerator,
        }
    }

    #[test]
    fn text_line_for_absent_accelerator() {
        assert_eq!(
            summary_line(&snapshot(Accelerator::Absent)),
            "10:00:00 cpu 37.2% used mem 4.0 GB/16.0 GB (12.0 GB free) gpu not found"
        );
    }

    #[test]
    fn text_line_for_present_accelerator() {
        let line = summary_line(&snapshot(Accelerator::Present(AcceleratorInfo {
            name: "NVIDIA RTX 3080".to_string(),
            memory_total_mib: 10240.0,
            memory_used_mib: 2048.0,
            load_percent: 45.0,
        })));
        assert!(line.ends_with("gpu NVIDIA RTX 3080 load 45.0% mem 2048.0 MB/10240.0 MB"));
    }

    #[test]
    fn json_lines_are_parseable() {
        let mut sink = PrintSink::new(Vec::new(), LineFormat::Json);
        sink.write_snapshot(&snapshot(Accelerator::error("boom")))
            .unwrap();
        sink.write_snapshot(&snapshot(Accelerator::Absent)).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["accelerator"]["status"], "error");
        assert_eq!(lines[0]["accelerator"]["message"], "boom");
        assert_eq!(lines[1]["memory"]["total_bytes"], 16 * GIB);
    }

    #[test]
    fn json_timestamp_is_rfc3339() {
        let snapshot = snapshot(Accelerator::Absent);
        let value = serde_json::to_value(&snapshot).unwrap();
        let raw = value["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(raw).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), snapshot.timestamp);
    }
}
