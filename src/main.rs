use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::KeyEventKind;
use tokio::sync::mpsc;

use hostpulse::app::App;
use hostpulse::config::{self, load_config, load_config_from_path};
use hostpulse::event::{Event, EventHandler, snapshot_channel};
use hostpulse::headless::{LineFormat, PrintSink};
use hostpulse::logging;
use hostpulse::scheduler::Scheduler;
use hostpulse::system::collector::Collector;
use hostpulse::system::snapshot::Snapshot;
use hostpulse::ui;

#[derive(Parser)]
#[command(
    name = "hostpulse",
    about = "CPU, memory and GPU utilization dashboard"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling interval in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    tick_interval_ms: Option<u64>,

    /// Print one line per sample instead of drawing the dashboard.
    #[arg(long, default_value_t = false)]
    headless: bool,

    /// Print samples as JSON lines (implies --headless).
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Take a single sample, print it and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Skip GPU detection and sampling.
    #[arg(long, default_value_t = false)]
    no_accelerator: bool,

    /// GPU management tool to run instead of nvidia-smi.
    #[arg(long)]
    accelerator_program: Option<String>,

    /// Write JSON logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    let format = if cli.json {
        LineFormat::Json
    } else {
        LineFormat::Text
    };

    if cli.once {
        logging::init_tracing_stderr(&config.logging.level)?;
        return run_once(&config, format).await;
    }
    if cli.headless || cli.json {
        logging::init_tracing_stderr(&config.logging.level)?;
        return run_headless(&config, format).await;
    }

    if let Some(path) = &config.logging.file {
        logging::init_tracing_json(path, &config.logging.level)?;
    }
    run_dashboard(&config).await
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ms) = cli.tick_interval_ms {
        config.general.tick_interval_ms = ms;
    }
    if cli.no_accelerator {
        config.accelerator.enabled = false;
    }
    if let Some(ref program) = cli.accelerator_program {
        config.accelerator.program = program.clone();
    }
    if let Some(ref path) = cli.log_file {
        config.logging.file = Some(path.clone());
    }

    config
}

async fn run_once(config: &config::Config, format: LineFormat) -> Result<()> {
    let mut collector = Collector::from_config(&config.accelerator).await?;
    let snapshot = collector.collect().await?;
    PrintSink::new(std::io::stdout(), format).write_snapshot(&snapshot)
}

async fn run_headless(config: &config::Config, format: LineFormat) -> Result<()> {
    let collector = Collector::from_config(&config.accelerator).await?;
    let mut scheduler = Scheduler::new(collector, config.general.tick_interval());
    scheduler
        .start(PrintSink::new(std::io::stdout(), format))
        .await?;

    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted?;
            tracing::info!("interrupted");
        }
        _ = scheduler.closed() => {}
    }

    scheduler.stop().await
}

async fn run_dashboard(config: &config::Config) -> Result<()> {
    let collector = Collector::from_config(&config.accelerator).await?;
    let mut scheduler = Scheduler::new(collector, config.general.tick_interval());
    let (sink, snapshots) = snapshot_channel();
    scheduler.start(sink).await?;

    let mut app = App::new(config);
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, &mut app, snapshots).await;
    ratatui::restore();

    // A host failure ends the dashboard loop; stop() hands it back.
    let stopped = scheduler.stop().await;
    result.and(stopped)
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    snapshots: mpsc::UnboundedReceiver<Snapshot>,
) -> Result<()> {
    let mut events = EventHandler::new(snapshots);

    terminal.draw(|frame| ui::draw(frame, app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Press {
                    let action = app.map_key(key);
                    app.dispatch(action);
                }
            }
            Event::Snapshot(snapshot) => app.on_snapshot(snapshot),
            Event::Resize => {}
            Event::SamplerClosed => break,
        }
        terminal.draw(|frame| ui::draw(frame, app))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["hostpulse", "--config", "/nonexistent/hostpulse.toml"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_config_file() {
        let cli = parse(&[
            "--tick-interval-ms",
            "500",
            "--no-accelerator",
            "--accelerator-program",
            "/opt/bin/nvidia-smi",
            "--log-file",
            "/tmp/hostpulse.log",
        ]);
        let config = load_config_for_cli(&cli);
        assert_eq!(config.general.tick_interval_ms, 500);
        assert!(!config.accelerator.enabled);
        assert_eq!(config.accelerator.program, "/opt/bin/nvidia-smi");
        assert_eq!(
            config.logging.file.as_deref(),
            Some(std::path::Path::new("/tmp/hostpulse.log"))
        );
    }

    #[test]
    fn defaults_without_flags() {
        let config = load_config_for_cli(&parse(&[]));
        assert_eq!(config.general.tick_interval_ms, 2000);
        assert!(config.accelerator.enabled);
        assert_eq!(config.accelerator.program, "nvidia-smi");
    }

    #[test]
    fn zero_interval_flag_is_rejected() {
        let result = Cli::try_parse_from(["hostpulse", "--tick-interval-ms", "0"]);
        assert!(result.is_err());
    }
}
