use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::system::accelerator::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT, ProbeConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub accelerator: AcceleratorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(alias = "tickIntervalMillis")]
    pub tick_interval_ms: u64,
    pub theme: String,
    pub color_support: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            tick_interval_ms: 2000,
            theme: "dark".to_string(),
            color_support: "auto".to_string(),
        }
    }
}

impl GeneralConfig {
    /// Zero would make the ticker spin, so it falls back to the default cadence.
    pub fn tick_interval(&self) -> Duration {
        match self.tick_interval_ms {
            0 => Duration::from_millis(GeneralConfig::default().tick_interval_ms),
            ms => Duration::from_millis(ms),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AcceleratorConfig {
    pub enabled: bool,
    pub program: String,
    pub timeout_ms: u64,
    pub suppress_console_window: bool,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        AcceleratorConfig {
            enabled: true,
            program: DEFAULT_PROGRAM.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            suppress_console_window: true,
        }
    }
}

impl AcceleratorConfig {
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            program: self.program.clone(),
            timeout: match self.timeout_ms {
                0 => DEFAULT_TIMEOUT,
                ms => Duration::from_millis(ms),
            },
            suppress_console_window: self.suppress_console_window,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hostpulse").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

/// Missing or malformed files fall back to defaults. Logging is not up yet at this
/// point, so problems are reported to stderr.
pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("hostpulse: ignoring invalid config {}: {err}", path.display());
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}
