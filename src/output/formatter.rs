//! TAP line formatting
//!
//! Pure mapping from a test outcome to the text lines written for it.

use crate::models::{Detail, DiagnosticDetail, OutcomeKind, TestOutcome};
use crate::output::ColorFormatter;

/// Indentation of the source snippet line under a diagnostic comment
const SNIPPET_INDENT: &str = "    ";

/// Line formatter
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFormatter {
    color: ColorFormatter,
}

impl LineFormatter {
    pub fn new(color: ColorFormatter) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(ColorFormatter::new(false))
    }

    /// All lines for one outcome, status line first
    pub fn format(&self, outcome: &TestOutcome) -> Vec<String> {
        let mut lines = vec![self.status_line(outcome)];

        match (&outcome.detail, outcome.kind.tag()) {
            (Detail::Diagnostic(detail), Some(tag)) => {
                lines.extend(self.diagnostic_block(tag, &outcome.identity, detail));
            }
            (Detail::Skip { reason }, _) => {
                lines.push(format!("# SKIP: {reason}"));
            }
            (Detail::None, Some(tag)) if outcome.kind == OutcomeKind::UnexpectedSuccess => {
                lines.push(format!("# {tag}: {}", outcome.identity));
            }
            _ => {}
        }

        lines
    }

    /// `<token> <sequence> - <description>`, only the token colorized
    pub fn status_line(&self, outcome: &TestOutcome) -> String {
        format!(
            "{} {} - {}",
            self.color.paint(outcome.kind.token(), outcome.kind.color()),
            outcome.sequence,
            outcome.description
        )
    }

    /// Comment line naming the error plus the snippet line when available
    pub fn diagnostic_block(
        &self,
        tag: &str,
        identity: &str,
        detail: &DiagnosticDetail,
    ) -> Vec<String> {
        let mut lines = vec![format!(
            "# {tag}: {identity}: {} on file {}, line {}",
            detail.error_kind_name, detail.file, detail.line
        )];
        if let Some(snippet) = &detail.source_snippet {
            lines.push(format!("{SNIPPET_INDENT}{snippet}"));
        }
        lines
    }

    pub fn plan_line(&self, total: usize) -> String {
        format!("1..{total}")
    }
}
