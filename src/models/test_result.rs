//! Test outcome models
//!
//! Defines test identities, outcome kinds and the run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::DiagnosticDetail;
use crate::output::Color;

/// Stable identity of a test: its method name within its enclosing groups
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestId {
    /// Enclosing group names, outermost first
    pub path: Vec<String>,
    pub method: String,
}

impl TestId {
    pub fn new(path: Vec<String>, method: impl Into<String>) -> Self {
        Self {
            path,
            method: method.into(),
        }
    }

    /// Innermost group name, empty for an ungrouped test
    pub fn group(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// Path and method joined with `::`
    pub fn identity(&self) -> String {
        let mut parts: Vec<&str> = self.path.iter().map(String::as_str).collect();
        parts.push(&self.method);
        parts.join("::")
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

/// What the reporter knows about a test besides its outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub id: TestId,
    /// Narrative text declared with the test
    pub narrative: Option<String>,
}

impl TestInfo {
    pub fn new(id: TestId) -> Self {
        Self {
            id,
            narrative: None,
        }
    }

    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = Some(narrative.into());
        self
    }

    /// First line of the narrative text, if it has a non-blank one
    pub fn short_description(&self) -> Option<&str> {
        self.narrative
            .as_deref()
            .and_then(|text| text.trim().lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// The human-readable status-line description
    pub fn description(&self) -> String {
        match self.short_description() {
            Some(line) => line.to_string(),
            None => format!("{} ({})", self.id.method, self.id.group()),
        }
    }
}

/// Classification of one completed test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
    Error,
    ExpectedFailure,
    UnexpectedSuccess,
    Skipped,
}

impl OutcomeKind {
    /// TAP status token
    pub fn token(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "ok",
            OutcomeKind::Failure | OutcomeKind::Error | OutcomeKind::UnexpectedSuccess => "not ok",
            OutcomeKind::ExpectedFailure | OutcomeKind::Skipped => "skip",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            OutcomeKind::Success => Color::Green,
            OutcomeKind::Failure | OutcomeKind::Error | OutcomeKind::UnexpectedSuccess => {
                Color::Red
            }
            OutcomeKind::ExpectedFailure | OutcomeKind::Skipped => Color::Yellow,
        }
    }

    /// Tag of the diagnostic comment, `None` for a plain success
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            OutcomeKind::Success => None,
            OutcomeKind::Failure => Some("FAIL"),
            OutcomeKind::Error => Some("ERROR"),
            OutcomeKind::ExpectedFailure => Some("EXPECTED_FAILURE"),
            OutcomeKind::UnexpectedSuccess => Some("UNEXPECTED_SUCCESS"),
            OutcomeKind::Skipped => Some("SKIP"),
        }
    }

    /// Outcomes that make a run unsuccessful and trigger fail-fast
    pub fn is_failing(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Failure | OutcomeKind::Error | OutcomeKind::UnexpectedSuccess
        )
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::Failure => write!(f, "failure"),
            OutcomeKind::Error => write!(f, "error"),
            OutcomeKind::ExpectedFailure => write!(f, "expected failure"),
            OutcomeKind::UnexpectedSuccess => write!(f, "unexpected success"),
            OutcomeKind::Skipped => write!(f, "skipped"),
        }
    }
}

/// Detail carried by an outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detail {
    None,
    Diagnostic(DiagnosticDetail),
    Skip { reason: String },
}

/// One rendered test outcome. Built at emission time, never retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestOutcome {
    pub sequence: usize,
    pub identity: String,
    pub description: String,
    pub kind: OutcomeKind,
    pub detail: Detail,
}

/// Per-kind totals of a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tests_run: usize,
    pub successes: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub expected_failures: usize,
    pub unexpected_successes: usize,
    /// Teardown and cleanup errors reported under an already numbered test
    pub additional_errors: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            tests_run: 0,
            successes: 0,
            failures: 0,
            errors: 0,
            skipped: 0,
            expected_failures: 0,
            unexpected_successes: 0,
            additional_errors: 0,
            started_at,
            duration_ms: 0,
        }
    }

    /// Count one emitted outcome
    pub fn tally(&mut self, kind: OutcomeKind) {
        self.tests_run += 1;
        match kind {
            OutcomeKind::Success => self.successes += 1,
            OutcomeKind::Failure => self.failures += 1,
            OutcomeKind::Error => self.errors += 1,
            OutcomeKind::ExpectedFailure => self.expected_failures += 1,
            OutcomeKind::UnexpectedSuccess => self.unexpected_successes += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }

    pub fn was_successful(&self) -> bool {
        self.failures == 0
            && self.errors == 0
            && self.unexpected_successes == 0
            && self.additional_errors == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.was_successful() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ran {} | Pass: {} | Fail: {} | Error: {} | Skip: {} | Expected failure: {} | Unexpected success: {} | Duration: {}ms",
            self.tests_run,
            self.successes,
            self.failures,
            self.errors,
            self.skipped,
            self.expected_failures,
            self.unexpected_successes,
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(method: &str) -> TestInfo {
        TestInfo::new(TestId::new(vec!["TestableTest".to_string()], method))
    }

    #[test]
    fn test_identity() {
        let id = TestId::new(vec!["outer".into(), "inner".into()], "test_it");
        assert_eq!(id.identity(), "outer::inner::test_it");
        assert_eq!(id.group(), "inner");
    }

    #[test]
    fn test_description_from_narrative() {
        let test = info("test_error").with_narrative("\n   A test with errors\n\n  More text\n");
        assert_eq!(test.description(), "A test with errors");
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(
            info("test_success_no_doc").description(),
            "test_success_no_doc (TestableTest)"
        );
        assert_eq!(
            info("test_blank").with_narrative("   \n ").description(),
            "test_blank (TestableTest)"
        );
    }

    #[test]
    fn test_kind_table() {
        assert_eq!(OutcomeKind::Success.token(), "ok");
        assert_eq!(OutcomeKind::Success.tag(), None);
        assert_eq!(OutcomeKind::Failure.token(), "not ok");
        assert_eq!(OutcomeKind::Error.tag(), Some("ERROR"));
        assert_eq!(OutcomeKind::ExpectedFailure.token(), "skip");
        assert_eq!(OutcomeKind::ExpectedFailure.color(), Color::Yellow);
        assert_eq!(OutcomeKind::UnexpectedSuccess.token(), "not ok");
        assert_eq!(OutcomeKind::UnexpectedSuccess.color(), Color::Red);
        assert_eq!(OutcomeKind::Skipped.tag(), Some("SKIP"));
    }

    #[test]
    fn test_summary_tally() {
        let mut summary = RunSummary::new(Utc::now());
        summary.tally(OutcomeKind::Success);
        summary.tally(OutcomeKind::Skipped);
        summary.tally(OutcomeKind::ExpectedFailure);
        assert_eq!(summary.tests_run, 3);
        assert!(summary.was_successful());
        assert_eq!(summary.exit_code(), 0);

        summary.tally(OutcomeKind::UnexpectedSuccess);
        assert!(!summary.was_successful());
        assert_eq!(summary.exit_code(), 1);
    }
}
