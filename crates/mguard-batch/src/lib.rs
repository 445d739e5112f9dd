//! Multi-instrument batch runner.
//!
//! Wraps the signal-detection engine in a worker-pool model: instruments
//! are independent units of work with no shared mutable state, processed in
//! parallel and collected into per-instrument outcomes. The data-fetch
//! collaborator plugs in through the [`HistorySource`] port.

pub mod batch;
pub mod error;
pub mod source;

pub use batch::{BatchOutcome, BatchRunner, InstrumentSeries};
pub use error::{BatchError, BatchResult};
pub use source::{HistorySource, SourceError};
