//! Raised-error models
//!
//! A `TestError` is what the execution engine captures when a test part
//! raises: either a returned error, a failed assertion or a caught panic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// A position in a source file
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Kind of a raised error
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A failed assertion; the only kind classified as a test failure
    Assertion,
    DivisionByZero,
    ArithmeticOverflow,
    IndexOutOfBounds,
    Unwrap,
    /// Any other panic
    Panic,
    /// A returned error, named after its type
    Custom(String),
}

impl ErrorKind {
    pub fn name(&self) -> &str {
        match self {
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::ArithmeticOverflow => "ArithmeticOverflow",
            ErrorKind::IndexOutOfBounds => "IndexOutOfBounds",
            ErrorKind::Unwrap => "UnwrapFailed",
            ErrorKind::Panic => "Panic",
            ErrorKind::Custom(name) => name,
        }
    }

    /// Whether an error of this kind is reported as a failure rather than an error
    pub fn is_failure(&self) -> bool {
        matches!(self, ErrorKind::Assertion)
    }

    /// Classify a panic by its message
    pub fn from_panic_message(message: &str) -> Self {
        if message.starts_with("assertion") {
            ErrorKind::Assertion
        } else if message.starts_with("attempt to divide by zero")
            || message.starts_with("attempt to calculate the remainder with a divisor of zero")
        {
            ErrorKind::DivisionByZero
        } else if message.contains("with overflow") {
            ErrorKind::ArithmeticOverflow
        } else if message.starts_with("index out of bounds")
            || message.contains("out of range for slice")
        {
            ErrorKind::IndexOutOfBounds
        } else if message.starts_with("called `Option::unwrap()`")
            || message.starts_with("called `Result::unwrap()`")
        {
            ErrorKind::Unwrap
        } else {
            ErrorKind::Panic
        }
    }

    /// Kind for a returned error of type `E`, e.g. `ParseIntError`
    pub fn of_type<E: ?Sized>() -> Self {
        ErrorKind::Custom(short_type_name(std::any::type_name::<E>()).to_string())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strip the module path from a type name, keeping generic arguments intact
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// An error raised inside a test part
///
/// `trace` is ordered outermost to innermost; the raise site is last.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    pub kind: ErrorKind,
    pub message: String,
    pub trace: Vec<SourceLocation>,
}

impl TestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// An assertion failure raised at the caller's location
    #[track_caller]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Assertion, message).at(SourceLocation::caller())
    }

    /// A caught panic, classified by its message. `trace` runs outermost to
    /// innermost and ends at the panic location.
    pub fn from_panic(message: impl Into<String>, trace: Vec<SourceLocation>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::from_panic_message(&message),
            message,
            trace,
        }
    }

    /// A returned error, raised at the caller's location
    #[track_caller]
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(ErrorKind::of_type::<E>(), error.to_string()).at(SourceLocation::caller())
    }

    /// Push an inner frame onto the trace
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.trace.push(location);
        self
    }

    /// The raise site, if any frame was recorded
    pub fn raise_site(&self) -> Option<&SourceLocation> {
        self.trace.last()
    }

    pub fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(site) = self.raise_site() {
            write!(f, " at {site}")?;
        }
        Ok(())
    }
}

/// Structured detail extracted from a `TestError`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticDetail {
    pub error_kind_name: String,
    pub file: String,
    pub line: u32,
    pub source_snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_classification() {
        assert_eq!(
            ErrorKind::from_panic_message("attempt to divide by zero"),
            ErrorKind::DivisionByZero
        );
        assert_eq!(
            ErrorKind::from_panic_message(
                "attempt to calculate the remainder with a divisor of zero"
            ),
            ErrorKind::DivisionByZero
        );
        assert_eq!(
            ErrorKind::from_panic_message("attempt to add with overflow"),
            ErrorKind::ArithmeticOverflow
        );
        assert_eq!(
            ErrorKind::from_panic_message(
                "index out of bounds: the len is 3 but the index is 7"
            ),
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(
            ErrorKind::from_panic_message("called `Option::unwrap()` on a `None` value"),
            ErrorKind::Unwrap
        );
        assert_eq!(
            ErrorKind::from_panic_message("assertion `left == right` failed"),
            ErrorKind::Assertion
        );
        assert_eq!(ErrorKind::from_panic_message("boom"), ErrorKind::Panic);
    }

    #[test]
    fn test_only_assertions_are_failures() {
        assert!(ErrorKind::Assertion.is_failure());
        assert!(!ErrorKind::DivisionByZero.is_failure());
        assert!(!ErrorKind::Custom("ParseIntError".into()).is_failure());
    }

    #[test]
    fn test_custom_kind_name() {
        let err = "x".parse::<i32>().unwrap_err();
        let error = TestError::from_error(&err);
        assert_eq!(error.kind.name(), "ParseIntError");
        assert_eq!(error.raise_site().map(|l| l.file.as_str()), Some(file!()));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("core::num::error::ParseIntError"), "ParseIntError");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_assertion_records_caller() {
        let line = line!() + 1;
        let error = TestError::assertion("nope");
        let site = error.raise_site().unwrap();
        assert_eq!(site.line, line);
        assert_eq!(error.kind, ErrorKind::Assertion);
    }
}
