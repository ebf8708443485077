use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Record – one `x y` line
// ---------------------------------------------------------------------------

/// A single two-field line. Both fields are kept as opaque, trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub x: String,
    pub y: String,
}

/// Classification of one complete line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Record(Record),
    /// Empty or whitespace-only; ignored without complaint.
    Blank,
    /// Anything other than exactly two whitespace-separated fields.
    Malformed,
}

impl Record {
    pub fn parse(line: &str) -> ParsedLine {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (None, _, _) => ParsedLine::Blank,
            (Some(x), Some(y), None) => ParsedLine::Record(Record {
                x: x.to_string(),
                y: y.to_string(),
            }),
            _ => ParsedLine::Malformed,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleSeries – accumulated state of one reader
// ---------------------------------------------------------------------------

/// Everything a reader has consumed from its source so far.
///
/// `x_values` and `y_values` only ever grow together, so their lengths match
/// whenever the series is observed from outside a `&mut` borrow.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    source: PathBuf,
    x_values: Vec<String>,
    y_values: Vec<String>,
    /// Byte offset one past the last consumed `\n`.
    cursor: u64,
    /// Bumped on every reset so in-flight batches from before it are dropped.
    epoch: u64,
}

impl SampleSeries {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            x_values: Vec::new(),
            y_values: Vec::new(),
            cursor: 0,
            epoch: 0,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.x_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_values.is_empty()
    }

    /// Forget everything and start over from byte 0.
    pub fn reset(&mut self) {
        self.x_values.clear();
        self.y_values.clear();
        self.cursor = 0;
        self.epoch += 1;
    }

    /// Append a batch read under `epoch` and move the cursor to `cursor`.
    ///
    /// Returns `false` (and changes nothing) if the series was reset since
    /// the batch was started.
    pub fn commit(&mut self, epoch: u64, records: Vec<Record>, cursor: u64) -> bool {
        if epoch != self.epoch {
            return false;
        }
        self.x_values.reserve(records.len());
        self.y_values.reserve(records.len());
        for Record { x, y } in records {
            self.x_values.push(x);
            self.y_values.push(y);
        }
        self.cursor = cursor;
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            source: self.source.clone(),
            x_values: self.x_values.clone(),
            y_values: self.y_values.clone(),
            cursor: self.cursor,
            epoch: self.epoch,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot – owned copy handed to consumers
// ---------------------------------------------------------------------------

/// A point-in-time copy of a [`SampleSeries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub source: PathBuf,
    pub x_values: Vec<String>,
    pub y_values: Vec<String>,
    pub cursor: u64,
    pub epoch: u64,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.x_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x_values.is_empty()
    }

    /// Most recent raw pair.
    pub fn last(&self) -> Option<(&str, &str)> {
        self.x_values
            .last()
            .zip(self.y_values.last())
            .map(|(x, y)| (x.as_str(), y.as_str()))
    }

    /// Pairs whose fields both parse as `f64`, in file order.
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.x_values
            .iter()
            .zip(&self.y_values)
            .filter_map(|(x, y)| Some([x.parse().ok()?, y.parse().ok()?]))
            .collect()
    }
}
