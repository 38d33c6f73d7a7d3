//! Records of trials, sessions and solver diagnostics.
//!
//! A [`Record`] is a bag of named values. Trials and sessions emit records,
//! solvers attach diagnostics to them, and recorders decide where they go:
//! [`LogRecorder`] aggregates them into log lines, [`BufferedRecorder`]
//! keeps them in memory and [`NullRecorder`] drops them.
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
