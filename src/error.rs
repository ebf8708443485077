use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong during a single poll cycle.
///
/// None of these end a reader: the worker logs them and tries again on the
/// next cycle.
#[derive(Debug, Error)]
pub enum TailError {
    /// The source could not be opened (missing, permissions, ...).
    #[error("source {} is unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A complete line that is neither blank nor exactly two fields.
    #[error("malformed record in {} at byte {offset}: {line:?}", path.display())]
    MalformedRecord {
        path: PathBuf,
        offset: u64,
        line: String,
    },

    /// Stat, seek or read failed after the source was opened.
    #[error("I/O error while reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
