//! Run results: per-file outcomes and the files they are written to.

pub mod outcome;
pub mod recorder;

pub use outcome::{RunSummary, SendOutcome, SendStatus};
pub use recorder::{CSV_HEADER, ResultRecorder};
