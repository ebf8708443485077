/// Data layer: parsed records, accumulated series and the poll cycle.
///
/// Architecture:
/// ```text
///   file1.txt  (appended to by someone else)
///        │
///        ▼
///   ┌──────────┐
///   │  reader   │  seek to cursor → complete lines → Vec<Record>
///   └──────────┘
///        │  one critical section
///        ▼
///   ┌──────────────┐
///   │ SampleSeries  │  x_values / y_values, cursor, epoch
///   └──────────────┘
///        │
///        ▼
///     Snapshot      owned copy for consumers
/// ```

pub mod model;
pub mod reader;
