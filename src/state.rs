use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::TailConfig;
use crate::data::model::Snapshot;
use crate::tail::{self, TailHandle};

// ---------------------------------------------------------------------------
// Per-channel summary
// ---------------------------------------------------------------------------

/// One row of the periodic progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub name: String,
    pub samples: usize,
    /// Samples added since the previous refresh (0 if the series shrank).
    pub new_samples: usize,
    pub last: Option<(String, String)>,
    /// Numeric bounds over the pairs that parse as numbers.
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
}

impl ChannelSummary {
    fn from_snapshot(name: String, snap: &Snapshot, previous: usize) -> Self {
        let points = snap.points();
        Self {
            name,
            samples: snap.len(),
            new_samples: snap.len().saturating_sub(previous),
            last: snap.last().map(|(x, y)| (x.to_string(), y.to_string())),
            x_range: bounds(points.iter().map(|p| p[0])),
            y_range: bounds(points.iter().map(|p| p[1])),
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// Monitor – all attached channels
// ---------------------------------------------------------------------------

struct Channel {
    handle: TailHandle,
    last_len: usize,
}

/// The consumer side: one reader per source, refreshed on the caller's cadence.
pub struct Monitor {
    channels: Vec<Channel>,
}

impl Monitor {
    /// Attach one reader per path, in order.
    pub fn attach_all(paths: &[PathBuf], config: &TailConfig) -> Result<Self> {
        let channels = paths
            .iter()
            .map(|path| -> Result<Channel> {
                let handle = tail::attach(path.clone(), config)
                    .with_context(|| format!("starting reader for {}", path.display()))?;
                Ok(Channel {
                    handle,
                    last_len: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { channels })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Snapshot every channel and report what changed since the last call.
    pub fn refresh(&mut self) -> Vec<ChannelSummary> {
        self.channels
            .iter_mut()
            .map(|channel| {
                let snap = channel.handle.snapshot();
                let summary = ChannelSummary::from_snapshot(
                    channel.handle.source_name(),
                    &snap,
                    channel.last_len,
                );
                channel.last_len = snap.len();
                summary
            })
            .collect()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.channels.iter().map(|c| c.handle.snapshot()).collect()
    }

    pub fn reload_all(&mut self) {
        for channel in &mut self.channels {
            channel.handle.reload();
            channel.last_len = 0;
        }
    }

    /// Stop every reader and wait for its thread.
    pub fn shutdown(self) {
        for channel in &self.channels {
            channel.handle.request_stop();
        }
        for channel in self.channels {
            channel.handle.join();
        }
    }
}
