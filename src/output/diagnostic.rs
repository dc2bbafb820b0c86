//! Traceback-to-snippet extraction
//!
//! Picks the innermost frame of a raised error that belongs to the test's own
//! code and reads the single source line at that frame.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{DiagnosticDetail, SourceLocation, TestError};

/// Prefix of frames inside the Rust standard library
const STD_PREFIX: &str = "/rustc/";

/// Path fragments of toolchain sources and downloaded dependencies
const THIRD_PARTY_MARKERS: [&str; 3] = [
    "/.cargo/registry/",
    "/.cargo/git/",
    "/lib/rustlib/src/rust/",
];

/// Library directories whose frames sit between the runner and a test
const FRAMEWORK_DIRS: [&str; 3] = ["src/executor", "src/output", "src/models"];

fn framework_dirs() -> &'static [PathBuf] {
    static DIRS: OnceLock<Vec<PathBuf>> = OnceLock::new();
    DIRS.get_or_init(|| {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        FRAMEWORK_DIRS
            .iter()
            .map(|dir| normalize(&manifest_dir.join(dir)))
            .collect()
    })
}

/// Absolute, symlink-free form of `path` where it exists
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            return cwd.join(path);
        }
    }
    path.to_path_buf()
}

/// Extracts structured diagnostics from raised errors
#[derive(Clone, Debug, Default)]
pub struct DiagnosticExtractor {
    source_root: Option<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl DiagnosticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory relative source paths are resolved against first
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Treat frames under `prefix` as framework code
    pub fn exclude(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.excluded.push(prefix.into());
        self
    }

    /// Whether a frame belongs to framework code rather than the test
    pub fn is_framework_frame(&self, location: &SourceLocation) -> bool {
        if location.file.starts_with(STD_PREFIX)
            || THIRD_PARTY_MARKERS
                .iter()
                .any(|marker| location.file.contains(marker))
        {
            return true;
        }

        let file = Path::new(&location.file);
        let normalized = normalize(file);
        framework_dirs().iter().any(|dir| normalized.starts_with(dir))
            || self
                .excluded
                .iter()
                .any(|prefix| file.starts_with(prefix) || normalized.starts_with(normalize(prefix)))
    }

    /// The innermost frame that belongs to the test, else the innermost frame
    pub fn test_frame<'e>(&self, error: &'e TestError) -> Option<&'e SourceLocation> {
        error
            .trace
            .iter()
            .rev()
            .find(|location| !self.is_framework_frame(location))
            .or_else(|| error.trace.last())
    }

    pub fn extract(&self, error: &TestError) -> DiagnosticDetail {
        let error_kind_name = error.kind.name().to_string();
        match self.test_frame(error) {
            Some(frame) => DiagnosticDetail {
                error_kind_name,
                file: frame.file.clone(),
                line: frame.line,
                source_snippet: self.read_line(&frame.file, frame.line),
            },
            None => DiagnosticDetail {
                error_kind_name,
                file: "<unknown>".to_string(),
                line: 0,
                source_snippet: None,
            },
        }
    }

    /// Read one line of a source file, trimmed. `None` when unavailable.
    pub fn read_line(&self, file: &str, line: u32) -> Option<String> {
        if line == 0 {
            return None;
        }
        let path = self.resolve(file)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read source {}: {}", path.display(), e);
                return None;
            }
        };
        content
            .lines()
            .nth(line as usize - 1)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn resolve(&self, file: &str) -> Option<PathBuf> {
        let path = Path::new(file);
        if path.is_absolute() {
            return path.exists().then(|| path.to_path_buf());
        }

        let mut candidates = Vec::new();
        if let Some(root) = &self.source_root {
            candidates.push(root.join(path));
        }
        candidates.push(path.to_path_buf());
        if let Some(manifest_dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
            candidates.push(PathBuf::from(manifest_dir).join(path));
        }

        candidates.into_iter().find(|candidate| candidate.is_file())
    }
}
