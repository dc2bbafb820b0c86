//! simpletap - TAP output for Rust test suites
//!
//! Runs suites of test cases and streams one TAP result line per test as it
//! completes, with a short diagnostic pointing at the failing source line.
//!
//! ## Usage
//!
//! ```no_run
//! use simpletap::{Suite, TapTestRunner, TestCase};
//!
//! let suite = Suite::new("Arithmetic")
//!     .case(
//!         TestCase::new("test_add", |ctx| Ok(ctx.assert_eq(2 + 2, 4)?))
//!             .narrative("Addition works"),
//!     )
//!     .case(TestCase::new("test_later", |ctx| Err(ctx.skip("not yet"))));
//!
//! let summary = TapTestRunner::new().run(&suite).expect("TAP stream");
//! std::process::exit(summary.exit_code());
//! ```
//!
//! ```text
//! ok 1 - Addition works
//! skip 2 - test_later (Arithmetic)
//! # SKIP: not yet
//! 1..2
//! ```

pub mod config;
pub mod executor;
pub mod models;
pub mod output;
pub mod utils;

pub use config::RunnerConfig;
pub use executor::{
    Interrupt, Reporter, RunError, Suite, TapTestRunner, TestCase, TestContext, TestResult,
};
pub use models::{ErrorKind, RunSummary, SourceLocation, TestError, TestInfo};
pub use output::{ColorMode, EmitterFactory, EmitterOptions, ResultEmitter, TapEmitterFactory};
