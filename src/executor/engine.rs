//! Sequential execution engine
//!
//! Runs suites one test at a time and reports each outcome through a
//! [`Reporter`]. Classification of a finished test is a pure decision over the
//! results of its parts; see [`classify`].

use tracing::debug;

use super::capture::catch_panic;
use super::suite::{Entry, Interrupt, Suite, TestCase, TestContext, TestResult};
use super::Reporter;
use crate::models::{TestError, TestInfo};

/// Outcome of one part (set-up, body, tear-down) of a test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartResult {
    Passed,
    Skipped(String),
    Raised(TestError),
}

impl PartResult {
    fn from_run(result: Result<TestResult, TestError>) -> Self {
        match result {
            Ok(Ok(())) => PartResult::Passed,
            Ok(Err(Interrupt::Skip(reason))) => PartResult::Skipped(reason),
            Ok(Err(Interrupt::Raise(error))) | Err(error) => PartResult::Raised(error),
        }
    }
}

/// Everything known about a finished test before it is reported
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartResults {
    pub set_up: PartResult,
    /// `None` when set-up did not pass
    pub body: Option<PartResult>,
    /// `None` when set-up did not pass
    pub tear_down: Option<PartResult>,
    pub cleanup_errors: Vec<TestError>,
    pub expecting_failure: bool,
}

/// Primary classification of a finished test
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(TestError),
    Error(TestError),
    Skipped(String),
    ExpectedFailure(TestError),
    UnexpectedSuccess,
}

impl Verdict {
    /// Failure for assertion errors, Error for anything else
    fn raised(error: TestError) -> Self {
        if error.is_failure() {
            Verdict::Failure(error)
        } else {
            Verdict::Error(error)
        }
    }

    fn is_raised(&self) -> bool {
        matches!(self, Verdict::Failure(_) | Verdict::Error(_))
    }
}

/// Verdict plus the errors reported under the same test without a new number
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub additional: Vec<TestError>,
}

/// Decide the outcome of a test from the results of its parts
pub fn classify(parts: PartResults) -> Classification {
    let mut verdict = match parts.set_up {
        PartResult::Raised(error) => Verdict::raised(error),
        PartResult::Skipped(reason) => Verdict::Skipped(reason),
        PartResult::Passed => match parts.body {
            Some(PartResult::Skipped(reason)) => Verdict::Skipped(reason),
            Some(PartResult::Raised(error)) if parts.expecting_failure => {
                Verdict::ExpectedFailure(error)
            }
            Some(PartResult::Raised(error)) => Verdict::raised(error),
            Some(PartResult::Passed) | None if parts.expecting_failure => {
                Verdict::UnexpectedSuccess
            }
            Some(PartResult::Passed) | None => Verdict::Success,
        },
    };

    let mut late_errors = Vec::new();
    match parts.tear_down {
        Some(PartResult::Raised(error)) => late_errors.push(error),
        Some(PartResult::Skipped(reason)) if verdict == Verdict::Success => {
            verdict = Verdict::Skipped(reason);
        }
        _ => {}
    }
    late_errors.extend(parts.cleanup_errors);

    let mut late_errors = late_errors.into_iter();
    if !verdict.is_raised() {
        if let Some(first) = late_errors.next() {
            verdict = Verdict::raised(first);
        }
    }

    Classification {
        verdict,
        additional: late_errors.collect(),
    }
}

/// Run every test of `suite` in declaration order
pub fn run_suite(suite: &Suite, reporter: &mut dyn Reporter) {
    let mut path = Vec::new();
    run_group(suite, &mut path, reporter);
}

fn run_group(suite: &Suite, path: &mut Vec<String>, reporter: &mut dyn Reporter) {
    path.push(suite.name().to_string());
    for entry in suite.entries() {
        if reporter.should_stop() {
            break;
        }
        match entry {
            Entry::Case(case) => run_test(suite, case, path, reporter),
            Entry::Suite(inner) => run_group(inner, path, reporter),
        }
    }
    path.pop();
}

/// Run one test case of `suite` and report its outcome
pub fn run_test(suite: &Suite, case: &TestCase, path: &[String], reporter: &mut dyn Reporter) {
    let info = case.info(path);
    reporter.start_test(&info);

    match case.skip_reason() {
        Some(reason) => {
            debug!("{} skipped before running", info.id);
            reporter.record_skipped(&info, reason);
        }
        None => {
            let classification = classify(execute(suite, case));
            report(reporter, &info, classification);
        }
    }

    reporter.stop_test(&info);
}

fn execute(suite: &Suite, case: &TestCase) -> PartResults {
    let mut ctx = TestContext::new();

    let set_up = PartResult::from_run(catch_panic(|| suite.call_set_up(&mut ctx)));
    let (body, tear_down) = if set_up == PartResult::Passed {
        let body = PartResult::from_run(catch_panic(|| case.call(&mut ctx)));
        let tear_down = PartResult::from_run(catch_panic(|| suite.call_tear_down(&mut ctx)));
        (Some(body), Some(tear_down))
    } else {
        (None, None)
    };

    let cleanup_errors = ctx.do_cleanups();

    PartResults {
        set_up,
        body,
        tear_down,
        cleanup_errors,
        expecting_failure: case.is_expected_failure(),
    }
}

fn report(reporter: &mut dyn Reporter, info: &TestInfo, classification: Classification) {
    match &classification.verdict {
        Verdict::Success => reporter.record_success(info),
        Verdict::Failure(error) => reporter.record_failure(info, error),
        Verdict::Error(error) => reporter.record_error(info, error),
        Verdict::Skipped(reason) => reporter.record_skipped(info, reason),
        Verdict::ExpectedFailure(error) => reporter.record_expected_failure(info, error),
        Verdict::UnexpectedSuccess => reporter.record_unexpected_success(info),
    }
    for error in &classification.additional {
        reporter.record_additional_error(info, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;

    fn error(kind: ErrorKind, message: &str) -> TestError {
        TestError::new(kind, message)
    }

    fn parts(body: PartResult) -> PartResults {
        PartResults {
            set_up: PartResult::Passed,
            body: Some(body),
            tear_down: Some(PartResult::Passed),
            cleanup_errors: Vec::new(),
            expecting_failure: false,
        }
    }

    #[test]
    fn test_classify_body_results() {
        assert_eq!(classify(parts(PartResult::Passed)).verdict, Verdict::Success);

        let assertion = error(ErrorKind::Assertion, "x");
        assert_eq!(
            classify(parts(PartResult::Raised(assertion.clone()))).verdict,
            Verdict::Failure(assertion)
        );

        let panic = error(ErrorKind::DivisionByZero, "y");
        assert_eq!(
            classify(parts(PartResult::Raised(panic.clone()))).verdict,
            Verdict::Error(panic)
        );

        assert_eq!(
            classify(parts(PartResult::Skipped("later".into()))).verdict,
            Verdict::Skipped("later".into())
        );
    }

    #[test]
    fn test_classify_expected_failure() {
        let assertion = error(ErrorKind::Assertion, "x");
        let mut expecting = parts(PartResult::Raised(assertion.clone()));
        expecting.expecting_failure = true;
        assert_eq!(
            classify(expecting).verdict,
            Verdict::ExpectedFailure(assertion)
        );

        let mut passing = parts(PartResult::Passed);
        passing.expecting_failure = true;
        assert_eq!(classify(passing).verdict, Verdict::UnexpectedSuccess);
    }

    #[test]
    fn test_classify_set_up_error_skips_body() {
        let setup = error(ErrorKind::Panic, "foo");
        let result = classify(PartResults {
            set_up: PartResult::Raised(setup.clone()),
            body: None,
            tear_down: None,
            cleanup_errors: Vec::new(),
            expecting_failure: true,
        });
        assert_eq!(result.verdict, Verdict::Error(setup));
    }

    #[test]
    fn test_classify_cleanup_error_escalates_success() {
        let first = error(ErrorKind::Panic, "first");
        let second = error(ErrorKind::Panic, "second");
        let mut with_cleanups = parts(PartResult::Passed);
        with_cleanups.cleanup_errors = vec![first.clone(), second.clone()];

        let result = classify(with_cleanups);
        assert_eq!(result.verdict, Verdict::Error(first));
        assert_eq!(result.additional, vec![second]);
    }

    #[test]
    fn test_classify_cleanup_error_after_failure_is_additional() {
        let assertion = error(ErrorKind::Assertion, "x");
        let cleanup = error(ErrorKind::Panic, "cleanup");
        let mut failing = parts(PartResult::Raised(assertion.clone()));
        failing.tear_down = Some(PartResult::Raised(cleanup.clone()));

        let result = classify(failing);
        assert_eq!(result.verdict, Verdict::Failure(assertion));
        assert_eq!(result.additional, vec![cleanup]);
    }

    #[test]
    fn test_classify_tear_down_skip() {
        let mut skipping = parts(PartResult::Passed);
        skipping.tear_down = Some(PartResult::Skipped("teardown".into()));
        assert_eq!(
            classify(skipping).verdict,
            Verdict::Skipped("teardown".into())
        );
    }
}
