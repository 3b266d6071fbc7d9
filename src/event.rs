use color_eyre::Result;
use color_eyre::eyre::eyre;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::scheduler::SnapshotSink;
use crate::system::snapshot::Snapshot;

#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Snapshot(Snapshot),
    /// The sampler dropped its sink; it ended because of a host failure.
    SamplerClosed,
}

/// Hands snapshots from the sampling task over to the UI loop, which owns the terminal.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl SnapshotSink for ChannelSink {
    fn on_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.tx
            .send(snapshot)
            .map_err(|_| eyre!("dashboard is no longer receiving snapshots"))
    }
}

pub fn snapshot_channel() -> (ChannelSink, mpsc::UnboundedReceiver<Snapshot>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSink { tx }, rx)
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(mut snapshots: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        let task = tokio::spawn(async move {
            let mut reader = event::EventStream::new();

            loop {
                tokio::select! {
                    maybe_event = reader.next() => {
                        match maybe_event {
                            Some(Ok(evt)) => {
                                let mapped = match evt {
                                    CrosstermEvent::Key(key) => Some(Event::Key(key)),
                                    CrosstermEvent::Resize(_, _) => Some(Event::Resize),
                                    _ => None,
                                };
                                if let Some(e) = mapped
                                    && tx.send(e).is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(_)) => break,
                            None => break,
                        }
                    }
                    maybe_snapshot = snapshots.recv() => {
                        let event = match maybe_snapshot {
                            Some(snapshot) => Event::Snapshot(snapshot),
                            None => Event::SamplerClosed,
                        };
                        let closed = matches!(event, Event::SamplerClosed);
                        if tx.send(event).is_err() || closed {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
