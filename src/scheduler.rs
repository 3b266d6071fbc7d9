//! Periodic sampling loop.
//!
//! The [`Scheduler`] moves through `Idle -> Running -> Stopped`. `start` takes one sample
//! inline so the sink has data straight away, then hands the [`Collector`] to a tokio task
//! that samples once per interval. Samples are strictly sequential: a slow tick delays
//! the next one and missed ticks are skipped, never run concurrently.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::system::accelerator::{CommandRunner, ToolRunner};
use crate::system::collector::Collector;
use crate::system::host::{HostMetricsReader, HostSource};
use crate::system::snapshot::Snapshot;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(2000);

/// How long `stop` waits for the tick task before aborting it.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Receives every completed snapshot, on the scheduler's task.
pub trait SnapshotSink: Send + 'static {
    fn on_snapshot(&mut self, snapshot: Snapshot) -> Result<()>;
}

impl<F> SnapshotSink for F
where
    F: FnMut(Snapshot) -> Result<()> + Send + 'static,
{
    fn on_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self(snapshot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<()>>,
}

pub struct Scheduler<H = HostMetricsReader, R = CommandRunner> {
    interval: Duration,
    state: SchedulerState,
    collector: Option<Collector<H, R>>,
    worker: Option<Worker>,
}

impl<H, R> Scheduler<H, R>
where
    H: HostSource + 'static,
    R: ToolRunner + 'static,
{
    /// A zero `interval` falls back to [`DEFAULT_TICK_INTERVAL`].
    pub fn new(collector: Collector<H, R>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            tracing::warn!(
                fallback_ms = DEFAULT_TICK_INTERVAL.as_millis() as u64,
                "zero tick interval, using default"
            );
            DEFAULT_TICK_INTERVAL
        } else {
            interval
        };
        Scheduler {
            interval,
            state: SchedulerState::Idle,
            collector: Some(collector),
            worker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Starts ticking. A second `start` while running is ignored; `start` after `stop`
    /// is an error. A host failure during the first sample is returned and leaves the
    /// scheduler stopped.
    pub async fn start<S: SnapshotSink>(&mut self, mut sink: S) -> Result<()> {
        match self.state {
            SchedulerState::Running => {
                tracing::debug!("sampling already running, start ignored");
                return Ok(());
            }
            SchedulerState::Stopped => {
                return Err(eyre!("sampling was stopped and cannot be restarted"));
            }
            SchedulerState::Idle => {}
        }

        // The collector stays in place until the first sample succeeds, so a `start`
        // cancelled mid-sample leaves the scheduler idle and restartable.
        let Some(collector) = self.collector.as_mut() else {
            self.state = SchedulerState::Stopped;
            return Err(eyre!("sampler has no collector"));
        };
        let first = match collector.collect().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.collector = None;
                self.state = SchedulerState::Stopped;
                return Err(err).wrap_err("initial sample failed");
            }
        };
        let Some(collector) = self.collector.take() else {
            return Err(eyre!("sampler has no collector"));
        };
        deliver(&mut sink, first);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_ticks(collector, sink, self.interval, shutdown_rx));
        self.worker = Some(Worker { shutdown, handle });
        self.state = SchedulerState::Running;

        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "sampling started"
        );
        Ok(())
    }

    /// Stops ticking. Once this returns the sink is never called again, unless the task
    /// had to be aborted mid-delivery after [`STOP_GRACE`]. Returns the host failure that
    /// ended sampling, if any.
    pub async fn stop(&mut self) -> Result<()> {
        self.state = SchedulerState::Stopped;
        self.collector = None;
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let _ = worker.shutdown.send(true);
        let mut handle = worker.handle;
        match tokio::time::timeout(STOP_GRACE, &mut handle).await {
            Ok(Ok(result)) => {
                tracing::info!("sampling stopped");
                result
            }
            Ok(Err(join_err)) => Err(eyre!("sampling task failed: {join_err}")),
            Err(_) => {
                handle.abort();
                tracing::warn!(grace = ?STOP_GRACE, "sampling task did not stop in time, aborted");
                Ok(())
            }
        }
    }

    /// Resolves once the tick task has ended by itself, which only happens after a host
    /// failure. Resolves immediately when nothing is running.
    pub async fn closed(&self) {
        if let Some(worker) = &self.worker {
            worker.shutdown.closed().await;
        }
    }
}

async fn run_ticks<H, R, S>(
    mut collector: Collector<H, R>,
    mut sink: S,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()>
where
    H: HostSource,
    R: ToolRunner,
    S: SnapshotSink,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            _ = ticker.tick() => {}
        }

        // Stopping drops an in-flight collect, which kills the accelerator child.
        let result = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            result = collector.collect() => result,
        };

        match result {
            Ok(snapshot) => {
                if *shutdown.borrow() {
                    return Ok(());
                }
                deliver(&mut sink, snapshot);
            }
            Err(err) => {
                tracing::error!(error = ?err, "host metrics unavailable, sampling stopped");
                return Err(err);
            }
        }
    }
}

fn deliver<S: SnapshotSink>(sink: &mut S, snapshot: Snapshot) {
    match catch_unwind(AssertUnwindSafe(|| sink.on_snapshot(snapshot))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "snapshot sink failed"),
        Err(_) => tracing::error!("snapshot sink panicked"),
    }
}
