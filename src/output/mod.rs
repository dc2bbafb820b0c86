//! Output module
//!
//! Turns test outcomes into TAP lines and writes them to a stream.

mod color;
mod diagnostic;
mod emitter;
mod formatter;

pub use color::{Color, ColorFormatter, ColorMode};
pub use diagnostic::DiagnosticExtractor;
pub use emitter::{EmitterFactory, EmitterOptions, ResultEmitter, TapEmitterFactory};
pub use formatter::LineFormatter;

use crate::models::RunSummary;
use anyhow::Context;
use std::path::Path;

/// Write a run summary to a file as pretty JSON
pub fn write_summary_to_file(path: impl AsRef<Path>, summary: &RunSummary) -> anyhow::Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write summary: {}", path.display()))?;

    Ok(())
}
