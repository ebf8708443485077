use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Malformed-line policy
// ---------------------------------------------------------------------------

/// What a poll does with a complete line that does not hold exactly two fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Drop the line, log it and move the cursor past it.
    #[default]
    Skip,
    /// Reject the whole cycle; nothing is committed and the cursor stays put.
    Abort,
}

impl std::str::FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedPolicy::Skip),
            "abort" => Ok(MalformedPolicy::Abort),
            other => Err(format!("unknown malformed-line policy: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Reader configuration
// ---------------------------------------------------------------------------

/// Per-reader settings, loadable from JSON.
///
/// ```json
/// { "poll_interval_ms": 500, "on_malformed": "abort" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    pub poll_interval_ms: u64,
    pub on_malformed: MalformedPolicy,
    /// Background threads are named `<prefix>-<file name>`.
    pub thread_name_prefix: String,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            on_malformed: MalformedPolicy::Skip,
            thread_name_prefix: "tail".to_string(),
        }
    }
}

impl TailConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Interval between two poll cycles; never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
