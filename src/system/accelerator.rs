use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::platform;
use super::snapshot::{Accelerator, AcceleratorInfo};

pub const DEFAULT_PROGRAM: &str = "nvidia-smi";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Arguments asking the tool for one `name, total MiB, used MiB, load %` line per device.
pub const QUERY_ARGS: [&str; 2] = [
    "--query-gpu=name,memory.total,memory.used,utilization.gpu",
    "--format=csv,noheader,nounits",
];

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub program: String,
    /// Upper bound for a single invocation, detection included.
    pub timeout: Duration,
    /// Honored on Windows only.
    pub suppress_console_window: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            program: DEFAULT_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
            suppress_console_window: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
}

/// Launches the management tool. `Err` means the process could not be run at all.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        capture_stdout: bool,
        suppress_console_window: bool,
    ) -> impl Future<Output = io::Result<ToolOutput>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        capture_stdout: bool,
        suppress_console_window: bool,
    ) -> io::Result<ToolOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if capture_stdout {
            command.stdout(Stdio::piped());
        } else {
            command.stdout(Stdio::null());
        }
        if suppress_console_window {
            platform::suppress_console_window(&mut command);
        }

        let output = command.output().await?;
        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Owns the availability flag, decided once when the probe is built.
pub struct AcceleratorProbe<R = CommandRunner> {
    runner: R,
    config: ProbeConfig,
    available: bool,
}

impl<R: ToolRunner> AcceleratorProbe<R> {
    pub async fn detect(runner: R, config: ProbeConfig) -> Self {
        let available = detect_availability(&runner, &config).await;
        if available {
            tracing::info!(program = %config.program, "accelerator management tool available");
        } else {
            tracing::info!(program = %config.program, "accelerator management tool unavailable");
        }
        Self {
            runner,
            config,
            available,
        }
    }

    /// A probe that never launches anything, used when the accelerator is switched off.
    pub fn disabled(runner: R, config: ProbeConfig) -> Self {
        Self {
            runner,
            config,
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Runs one query. Failures come back as [`Accelerator::Error`], never as `Err`.
    pub async fn query_reading(&self) -> Accelerator {
        let run = self.runner.run(
            &self.config.program,
            &QUERY_ARGS,
            true,
            self.config.suppress_console_window,
        );
        match tokio::time::timeout(self.config.timeout, run).await {
            Ok(Ok(output)) => {
                let reading = parse_reading(&output.stdout);
                if let Accelerator::Error { message } = &reading {
                    tracing::warn!(%message, "accelerator reading unparsable");
                }
                reading
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, program = %self.config.program, "accelerator query failed to launch");
                Accelerator::error(format!("failed to run {}: {err}", self.config.program))
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.timeout, "accelerator query timed out");
                Accelerator::error(format!(
                    "{} did not answer within {} ms",
                    self.config.program,
                    self.config.timeout.as_millis()
                ))
            }
        }
    }
}

/// Only a launch failure (or a hang past the timeout) counts as unavailable. A tool that
/// starts and exits non-zero is still treated as present.
pub async fn detect_availability<R: ToolRunner>(runner: &R, config: &ProbeConfig) -> bool {
    let run = runner.run(&config.program, &[], false, config.suppress_console_window);
    match tokio::time::timeout(config.timeout, run).await {
        Ok(Ok(output)) => {
            if output.exit_code != Some(0) {
                tracing::warn!(
                    exit_code = ?output.exit_code,
                    "accelerator tool exited unsuccessfully during detection, treating as available"
                );
            }
            true
        }
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "accelerator tool could not be launched");
            false
        }
        Err(_) => {
            tracing::warn!(timeout = ?config.timeout, "accelerator detection timed out");
            false
        }
    }
}

/// Parses the first non-empty line of query output.
///
/// Fewer than four fields is [`Accelerator::Absent`]; a bad number is
/// [`Accelerator::Error`]. Fields past the fourth and further lines are ignored.
pub fn parse_reading(stdout: &str) -> Accelerator {
    let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Accelerator::Absent;
    };
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return Accelerator::Absent;
    }

    let numbers = parse_number("memory.total", fields[1]).and_then(|total| {
        let used = parse_number("memory.used", fields[2])?;
        let load = parse_number("utilization.gpu", fields[3])?;
        Ok((total, used, load))
    });

    match numbers {
        Ok((memory_total_mib, memory_used_mib, load)) => Accelerator::Present(AcceleratorInfo {
            name: fields[0].to_string(),
            memory_total_mib,
            memory_used_mib,
            load_percent: load.clamp(0.0, 100.0),
        }),
        Err(message) => Accelerator::Error { message },
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(format!("{field} is not a finite number: {raw:?}")),
        Err(err) => Err(format!("could not parse {field} {raw:?}: {err}")),
    }
}
