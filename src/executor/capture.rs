//! Panic capture for test parts
//!
//! A process-wide panic hook is installed once. It records the message, the
//! stack between the test part and the panic, and the panic location for
//! panics raised on a thread that is currently running a test part, and stays
//! silent for them; every other panic goes to the previous hook.

use backtrace::Backtrace;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::models::{SourceLocation, TestError};

static INSTALL_HOOK: Once = Once::new();

/// Symbol of the hook closure; frames inside it are the hook's own
const HOOK_SYMBOL: &str = "capture::install_hook";

/// Symbol of the capture boundary; frames outside it are the engine's
const BOUNDARY_SYMBOL: &str = "capture::catch_panic";

type CapturedPanic = (String, Vec<SourceLocation>);

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<CapturedPanic>> = const { RefCell::new(None) };
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let message = payload_message(info.payload());
                let trace = stack_trace(info.location().map(SourceLocation::from));
                LAST_PANIC.with(|slot| *slot.borrow_mut() = Some((message, trace)));
            } else {
                previous(info);
            }
        }));
    });
}

/// Frames from the test part down to the raise site, outermost first
fn stack_trace(raise_site: Option<SourceLocation>) -> Vec<SourceLocation> {
    let cwd = std::env::current_dir().ok();
    let backtrace = Backtrace::new();

    // innermost first
    let symbols: Vec<(String, Option<SourceLocation>)> = backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .map(|symbol| {
            let name = symbol.name().map(|n| n.to_string()).unwrap_or_default();
            let location = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => Some(SourceLocation::new(
                    display_path(file, cwd.as_deref()),
                    line,
                    symbol.colno().unwrap_or(0),
                )),
                _ => None,
            };
            (name, location)
        })
        .collect();

    let start = symbols
        .iter()
        .position(|(name, _)| name.contains(HOOK_SYMBOL))
        .map_or(0, |idx| idx + 1);
    let end = symbols[start..]
        .iter()
        .position(|(name, _)| name.contains(BOUNDARY_SYMBOL))
        .map_or(symbols.len(), |idx| start + idx);

    let mut trace: Vec<SourceLocation> = symbols[start..end]
        .iter()
        .rev()
        .filter_map(|(_, location)| location.clone())
        .collect();

    if let Some(site) = raise_site {
        if trace.last() != Some(&site) {
            trace.push(site);
        }
    }
    trace
}

/// Source paths under the working directory are shown relative to it
fn display_path(file: &Path, cwd: Option<&Path>) -> String {
    cwd.and_then(|cwd| file.strip_prefix(cwd).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| file.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Resets the capturing flag even if the closure unwinds through us
struct CaptureGuard {
    previous: bool,
}

impl CaptureGuard {
    fn enter() -> Self {
        let previous = CAPTURING.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|flag| flag.set(self.previous));
    }
}

/// Run `f`, turning a panic into a `TestError` carrying its stack
#[inline(never)]
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, TestError> {
    install_hook();
    LAST_PANIC.with(|slot| slot.borrow_mut().take());

    let result = {
        let _guard = CaptureGuard::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };

    result.map_err(|payload| {
        match LAST_PANIC.with(|slot| slot.borrow_mut().take()) {
            Some((message, trace)) => TestError::from_panic(message, trace),
            None => TestError::from_panic(payload_message(payload.as_ref()), Vec::new()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use std::hint::black_box;

    #[test]
    fn test_value_passes_through() {
        assert_eq!(catch_panic(|| 41 + 1), Ok(42));
    }

    #[test]
    fn test_panic_is_captured_with_location() {
        let line = line!() + 2;
        let err = catch_panic(|| {
            panic!("boom");
        })
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Panic);
        assert_eq!(err.message, "boom");
        let site = err.raise_site().unwrap();
        assert_eq!(site.file, file!());
        assert_eq!(site.line, line);
    }

    #[test]
    fn test_division_by_zero() {
        let divisor = black_box(0);
        let err = catch_panic(|| 1 / divisor).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_formatted_message() {
        let err = catch_panic(|| panic!("value was {}", 7)).unwrap_err();
        assert_eq!(err.message, "value was 7");
    }

    #[test]
    fn test_flag_restored_after_panic() {
        let _ = catch_panic(|| panic!("first"));
        assert!(!CAPTURING.with(Cell::get));
    }

    #[test]
    fn test_panic_inside_std_keeps_calling_frame() {
        let line = line!() + 2;
        let err = catch_panic(|| {
            let v: Vec<u64> = Vec::with_capacity(black_box(usize::MAX));
            v.len()
        })
        .unwrap_err();

        assert_eq!(err.message, "capacity overflow");
        assert!(err.trace.len() > 1);
        assert!(err
            .trace
            .iter()
            .any(|frame| frame.file == file!() && frame.line == line));
    }

    #[test]
    fn test_display_path() {
        let cwd = Path::new("/work/crate");
        assert_eq!(
            display_path(Path::new("/work/crate/tests/api.rs"), Some(cwd)),
            "tests/api.rs"
        );
        assert_eq!(
            display_path(Path::new("/rustc/abc/library/core/src/time.rs"), Some(cwd)),
            "/rustc/abc/library/core/src/time.rs"
        );
    }
}
