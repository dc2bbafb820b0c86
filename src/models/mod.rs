//! Data models for TAP reporting
//!
//! This module contains all data structures shared by the engine and the emitter.

mod error;
mod test_result;

pub use error::{DiagnosticDetail, ErrorKind, SourceLocation, TestError};
pub use test_result::{Detail, OutcomeKind, RunSummary, TestId, TestInfo, TestOutcome};
