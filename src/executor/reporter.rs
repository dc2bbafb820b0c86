//! Reporter capability consumed by the execution engine
//!
//! The engine only ever talks to results through this trait: six outcome
//! callbacks, one callback for extra errors, and run/test hooks.

use crate::models::{RunSummary, TestError, TestInfo};

pub trait Reporter {
    fn start_test_run(&mut self) {}

    fn stop_test_run(&mut self) {}

    fn start_test(&mut self, _test: &TestInfo) {}

    fn stop_test(&mut self, _test: &TestInfo) {}

    fn record_success(&mut self, test: &TestInfo);

    fn record_failure(&mut self, test: &TestInfo, err: &TestError);

    fn record_error(&mut self, test: &TestInfo, err: &TestError);

    fn record_skipped(&mut self, test: &TestInfo, reason: &str);

    fn record_expected_failure(&mut self, test: &TestInfo, err: &TestError);

    fn record_unexpected_success(&mut self, test: &TestInfo);

    /// A teardown or cleanup error for the test whose outcome was just recorded
    fn record_additional_error(&mut self, test: &TestInfo, err: &TestError);

    /// Whether the engine should stop scheduling tests
    fn should_stop(&self) -> bool;

    /// Request that no further tests are started
    fn stop(&mut self);

    fn summary(&self) -> RunSummary;
}
