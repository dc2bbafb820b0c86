//! Test execution engine
//!
//! Suite definitions, panic capture, sequential execution and the runner that
//! ties them to a TAP stream.

mod capture;
pub mod engine;
mod reporter;
mod runner;
mod suite;

pub use capture::catch_panic;
pub use engine::{classify, run_suite, Classification, PartResult, PartResults, Verdict};
pub use reporter::Reporter;
pub use runner::{RunError, TapTestRunner};
pub use suite::{Entry, Interrupt, Suite, TestCase, TestContext, TestResult};
