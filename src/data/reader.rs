use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::MalformedPolicy;
use crate::error::TailError;

use super::model::{ParsedLine, Record, SampleSeries, Snapshot};

// ---------------------------------------------------------------------------
// Poll outcome
// ---------------------------------------------------------------------------

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Records appended to the series.
    pub appended: usize,
    /// Malformed lines dropped under [`MalformedPolicy::Skip`].
    pub skipped: usize,
    /// The source had shrunk below the cursor and was re-read from byte 0.
    pub truncated: bool,
    /// Cursor after the cycle.
    pub cursor: u64,
}

// ---------------------------------------------------------------------------
// Tailer – the series plus the logic that feeds it
// ---------------------------------------------------------------------------

/// Incremental reader for one source file.
///
/// The file is reopened on every [`poll`](Tailer::poll), so it may be missing,
/// replaced or truncated between cycles.
#[derive(Debug)]
pub struct Tailer {
    source: PathBuf,
    policy: MalformedPolicy,
    series: Mutex<SampleSeries>,
}

impl Tailer {
    pub fn new(source: impl Into<PathBuf>, policy: MalformedPolicy) -> Self {
        let source = source.into();
        Self {
            series: Mutex::new(SampleSeries::new(source.clone())),
            source,
            policy,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source, or the whole path if it has none.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Drop everything read so far; the next poll starts again at byte 0.
    pub fn reload(&self) {
        self.lock().reset();
        log::debug!("{}: reload requested", self.source.display());
    }

    /// Run one poll cycle: read every line completed since the last cycle and
    /// append it to the series.
    ///
    /// On error nothing is committed and the cursor is left where it was,
    /// except that a detected truncation has already reset the series.
    pub fn poll(&self) -> Result<PollOutcome, TailError> {
        let (mut cursor, mut epoch) = {
            let series = self.lock();
            (series.cursor(), series.epoch())
        };

        let mut file = File::open(&self.source).map_err(|source| TailError::SourceUnavailable {
            path: self.source.clone(),
            source,
        })?;
        let len = file.metadata().map_err(|e| self.io_error(e))?.len();

        let truncated = len < cursor;
        if truncated {
            log::info!(
                "{}: shrank to {len} bytes (cursor at {cursor}), re-reading from start",
                self.source.display()
            );
            let mut series = self.lock();
            if series.epoch() == epoch {
                series.reset();
            }
            cursor = series.cursor();
            epoch = series.epoch();
        }

        file.seek(SeekFrom::Start(cursor))
            .map_err(|e| self.io_error(e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| self.io_error(e))?;

        // Anything after the last newline is still being written.
        let complete = match buf.iter().rposition(|&b| b == b'\n') {
            Some(end) => &buf[..=end],
            None => &buf[..0],
        };

        let mut records = Vec::new();
        let mut skipped = 0;
        let mut offset = cursor;
        for raw in complete.split_inclusive(|&b| b == b'\n') {
            let line = String::from_utf8_lossy(raw);
            match Record::parse(&line) {
                ParsedLine::Record(record) => records.push(record),
                ParsedLine::Blank => {}
                ParsedLine::Malformed => {
                    let err = TailError::MalformedRecord {
                        path: self.source.clone(),
                        offset,
                        line: line.trim_end().to_string(),
                    };
                    match self.policy {
                        MalformedPolicy::Abort => return Err(err),
                        MalformedPolicy::Skip => {
                            log::warn!("{err}, skipping");
                            skipped += 1;
                        }
                    }
                }
            }
            offset += raw.len() as u64;
        }

        let new_cursor = cursor + complete.len() as u64;
        let appended = records.len();
        let mut series = self.lock();
        if !series.commit(epoch, records, new_cursor) {
            log::debug!(
                "{}: reset during poll, dropping {appended} records",
                self.source.display()
            );
            return Ok(PollOutcome {
                truncated,
                cursor: series.cursor(),
                ..PollOutcome::default()
            });
        }

        Ok(PollOutcome {
            appended,
            skipped,
            truncated,
            cursor: new_cursor,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SampleSeries> {
        // A panic while holding the lock cannot leave the two sequences
        // mismatched, so a poisoned series is still usable.
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io_error(&self, source: std::io::Error) -> TailError {
        TailError::Io {
            path: self.source.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    fn setup(initial: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file1.txt");
        fs::write(&path, initial).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_all_lines_on_first_poll() {
        let (_dir, path) = setup("1 5\n2 6\n3 7\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);

        let outcome = tailer.poll().unwrap();
        assert_eq!(outcome.appended, 3);
        assert_eq!(outcome.cursor, 12);

        let snap = tailer.snapshot();
        assert_eq!(snap.x_values, ["1", "2", "3"]);
        assert_eq!(snap.y_values, ["5", "6", "7"]);
        assert_eq!(snap.cursor, 12);
    }

    #[test]
    fn snapshot_is_stable_without_poll() {
        let (_dir, path) = setup("1 5\n2 6\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);
        tailer.poll().unwrap();
        assert_eq!(tailer.snapshot(), tailer.snapshot());
    }

    #[test]
    fn appended_lines_extend_without_rewriting_history() {
        let (_dir, path) = setup("1 5\n2 6\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);
        tailer.poll().unwrap();
        let before = tailer.snapshot();

        append(&path, "3 7\n4 8\n5 9\n");
        let outcome = tailer.poll().unwrap();
        assert_eq!(outcome.appended, 3);

        let after = tailer.snapshot();
        assert_eq!(after.len(), before.len() + 3);
        assert_eq!(after.x_values[..2], before.x_values[..]);
        assert_eq!(after.y_values[..2], before.y_values[..]);
        assert_eq!(after.x_values[2..], ["3", "4", "5"]);
    }

    #[test]
    fn unterminated_line_waits_for_its_newline() {
        let (_dir, path) = setup("1 5\n2 ");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);

        tailer.poll().unwrap();
        assert_eq!(tailer.snapshot().x_values, ["1"]);
        assert_eq!(tailer.snapshot().cursor, 4);

        // Still no newline: nothing changes.
        assert_eq!(tailer.poll().unwrap().appended, 0);
        assert_eq!(tailer.snapshot().cursor, 4);

        append(&path, "6\n");
        tailer.poll().unwrap();
        let snap = tailer.snapshot();
        assert_eq!(snap.x_values, ["1", "2"]);
        assert_eq!(snap.y_values, ["5", "6"]);
        assert_eq!(snap.cursor, 8);
    }

    #[test]
    fn truncation_clears_and_rereads() {
        let (_dir, path) = setup("1 5\n2 6\n3 7\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);
        tailer.poll().unwrap();

        fs::write(&path, "9 1\n").unwrap();
        let outcome = tailer.poll().unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.appended, 1);

        let snap = tailer.snapshot();
        assert_eq!(snap.x_values, ["9"]);
        assert_eq!(snap.y_values, ["1"]);
        assert_eq!(snap.cursor, 4);
        assert_eq!(snap.epoch, 1);
    }

    #[test]
    fn missing_source_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.txt");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);

        let err = tailer.poll().unwrap_err();
        assert!(matches!(err, TailError::SourceUnavailable { .. }));
        assert!(tailer.snapshot().is_empty());
        assert_eq!(tailer.snapshot().cursor, 0);

        fs::write(&path, "1 2\n").unwrap();
        assert_eq!(tailer.poll().unwrap().appended, 1);
    }

    #[test]
    fn skip_policy_steps_over_bad_lines() {
        let (_dir, path) = setup("1 5\noops\n\n2 6 extra\n3 7\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);

        let outcome = tailer.poll().unwrap();
        assert_eq!(outcome.appended, 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.cursor, fs::metadata(&path).unwrap().len());
        assert_eq!(tailer.snapshot().x_values, ["1", "3"]);
    }

    #[test]
    fn abort_policy_commits_nothing() {
        let (_dir, path) = setup("1 5\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Abort);
        tailer.poll().unwrap();

        append(&path, "2 6\nbad\n3 7\n");
        match tailer.poll() {
            Err(TailError::MalformedRecord { offset, line, .. }) => {
                assert_eq!(offset, 8);
                assert_eq!(line, "bad");
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
        let snap = tailer.snapshot();
        assert_eq!(snap.x_values, ["1"]);
        assert_eq!(snap.cursor, 4);
    }

    #[test]
    fn reload_reads_from_the_start_again() {
        let (_dir, path) = setup("1 5\n2 6\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);
        tailer.poll().unwrap();

        tailer.reload();
        assert!(tailer.snapshot().is_empty());
        assert_eq!(tailer.snapshot().cursor, 0);

        assert_eq!(tailer.poll().unwrap().appended, 2);
        assert_eq!(tailer.snapshot().x_values, ["1", "2"]);
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let (_dir, path) = setup("1 5\r\n2 6\r\n");
        let tailer = Tailer::new(&path, MalformedPolicy::Skip);
        tailer.poll().unwrap();
        assert_eq!(tailer.snapshot().y_values, ["5", "6"]);
    }

    #[test]
    fn source_name_is_the_file_name() {
        let tailer = Tailer::new("/tmp/data/file2.txt", MalformedPolicy::Skip);
        assert_eq!(tailer.source_name(), "file2.txt");
    }
}
