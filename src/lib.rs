//! Incremental tailing of two-column sample files.
//!
//! A [`tail::TailHandle`] owns one background thread that polls a text file,
//! appends every newly completed `x y` line to a [`data::model::SampleSeries`]
//! and hands out consistent [`data::model::Snapshot`]s to any consumer.

pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;
pub mod tail;

pub use config::{MalformedPolicy, TailConfig};
pub use error::TailError;
pub use tail::{attach, TailHandle};
