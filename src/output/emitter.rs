//! Streaming TAP result emitter
//!
//! Receives one callback per completed test, numbers it, formats it and
//! writes the lines to the bound stream before returning.

use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::executor::Reporter;
use crate::models::{Detail, OutcomeKind, RunSummary, TestError, TestInfo, TestOutcome};
use crate::output::{ColorFormatter, DiagnosticExtractor, LineFormatter};
use crate::utils::Timer;

/// Settings an emitter is created with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Colorize status tokens
    pub color: bool,
    /// Request a stop after the first failing outcome
    pub fail_fast: bool,
    /// Accepted for compatibility, no effect on TAP output
    pub buffer: bool,
    /// Accepted for compatibility, no effect on TAP output
    pub descriptions: bool,
    /// Accepted for compatibility, no effect on TAP output
    pub verbosity: u8,
    /// Directory source snippets are resolved against
    pub source_root: Option<PathBuf>,
    /// Path prefixes whose frames are skipped when locating the failing line
    pub exclude: Vec<PathBuf>,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            color: false,
            fail_fast: false,
            buffer: false,
            descriptions: true,
            verbosity: 1,
            source_root: None,
            exclude: Vec::new(),
        }
    }
}

/// Creates the reporter a runner binds to its stream
pub trait EmitterFactory {
    fn create<'a>(
        &self,
        stream: &'a mut dyn Write,
        options: &EmitterOptions,
    ) -> Box<dyn Reporter + 'a>;
}

/// Factory for the default [`ResultEmitter`]
#[derive(Clone, Copy, Debug, Default)]
pub struct TapEmitterFactory;

impl EmitterFactory for TapEmitterFactory {
    fn create<'a>(
        &self,
        stream: &'a mut dyn Write,
        options: &EmitterOptions,
    ) -> Box<dyn Reporter + 'a> {
        Box::new(ResultEmitter::new(stream, options))
    }
}

/// The TAP result collector
pub struct ResultEmitter<'a> {
    stream: &'a mut dyn Write,
    formatter: LineFormatter,
    extractor: DiagnosticExtractor,
    sequence: usize,
    summary: RunSummary,
    fail_fast: bool,
    should_stop: bool,
    run_timer: Timer,
    test_timer: Option<Timer>,
}

impl<'a> ResultEmitter<'a> {
    pub fn new(stream: &'a mut dyn Write, options: &EmitterOptions) -> Self {
        let mut extractor = DiagnosticExtractor::new();
        if let Some(root) = &options.source_root {
            extractor = extractor.with_source_root(root);
        }
        for prefix in &options.exclude {
            extractor = extractor.exclude(prefix);
        }
        if options.buffer {
            debug!("Output buffering requested; TAP output is unaffected");
        }

        Self {
            stream,
            formatter: LineFormatter::new(ColorFormatter::new(options.color)),
            extractor,
            sequence: 0,
            summary: RunSummary::new(Utc::now()),
            fail_fast: options.fail_fast,
            should_stop: false,
            run_timer: Timer::start("test run"),
            test_timer: None,
        }
    }

    /// Number of outcomes emitted so far
    pub fn tests_run(&self) -> usize {
        self.sequence
    }

    fn emit(&mut self, test: &TestInfo, kind: OutcomeKind, detail: Detail) {
        self.sequence += 1;
        self.summary.tally(kind);

        let outcome = TestOutcome {
            sequence: self.sequence,
            identity: test.id.identity(),
            description: test.description(),
            kind,
            detail,
        };

        if let Some(timer) = self.test_timer.take() {
            timer.stop();
        }
        debug!("{} {} {}", outcome.sequence, outcome.identity, kind);

        let lines = self.formatter.format(&outcome);
        self.write_lines(&lines);

        if self.fail_fast && kind.is_failing() {
            self.stop();
        }
    }

    fn emit_diagnostic(&mut self, test: &TestInfo, kind: OutcomeKind, err: &TestError) {
        let detail = self.extractor.extract(err);
        self.emit(test, kind, Detail::Diagnostic(detail));
    }

    fn write_lines(&mut self, lines: &[String]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.stream, "{line}"))
            .and_then(|()| self.stream.flush());

        if let Err(e) = result {
            warn!("Failed to write TAP output: {}", e);
        }
    }
}

impl Reporter for ResultEmitter<'_> {
    fn start_test_run(&mut self) {
        info!("Starting test run");
        self.summary.started_at = Utc::now();
        self.run_timer = Timer::start("test run");
    }

    fn stop_test_run(&mut self) {
        info!(
            "Test run finished: {} tests in {}ms",
            self.sequence,
            self.run_timer.elapsed_ms()
        );
    }

    fn start_test(&mut self, test: &TestInfo) {
        debug!("Running {}", test.id);
        self.test_timer = Some(Timer::start(test.id.identity()));
    }

    fn record_success(&mut self, test: &TestInfo) {
        self.emit(test, OutcomeKind::Success, Detail::None);
    }

    fn record_failure(&mut self, test: &TestInfo, err: &TestError) {
        self.emit_diagnostic(test, OutcomeKind::Failure, err);
    }

    fn record_error(&mut self, test: &TestInfo, err: &TestError) {
        self.emit_diagnostic(test, OutcomeKind::Error, err);
    }

    fn record_skipped(&mut self, test: &TestInfo, reason: &str) {
        self.emit(
            test,
            OutcomeKind::Skipped,
            Detail::Skip {
                reason: reason.to_string(),
            },
        );
    }

    fn record_expected_failure(&mut self, test: &TestInfo, err: &TestError) {
        self.emit_diagnostic(test, OutcomeKind::ExpectedFailure, err);
    }

    fn record_unexpected_success(&mut self, test: &TestInfo) {
        self.emit(test, OutcomeKind::UnexpectedSuccess, Detail::None);
    }

    fn record_additional_error(&mut self, test: &TestInfo, err: &TestError) {
        self.summary.additional_errors += 1;
        let tag = if err.is_failure() {
            OutcomeKind::Failure
        } else {
            OutcomeKind::Error
        }
        .tag()
        .unwrap_or("ERROR");

        let detail = self.extractor.extract(err);
        let lines = self
            .formatter
            .diagnostic_block(tag, &test.id.identity(), &detail);
        self.write_lines(&lines);

        if self.fail_fast {
            self.stop();
        }
    }

    fn should_stop(&self) -> bool {
        self.should_stop
    }

    fn stop(&mut self) {
        if !self.should_stop {
            debug!("Stop requested after {} tests", self.sequence);
        }
        self.should_stop = true;
    }

    fn summary(&self) -> RunSummary {
        let mut summary = self.summary.clone();
        summary.duration_ms = self.run_timer.elapsed_ms();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, SourceLocation, TestId};

    fn info(method: &str, narrative: Option<&str>) -> TestInfo {
        let info = TestInfo::new(TestId::new(vec!["TestableTest".to_string()], method));
        match narrative {
            Some(text) => info.with_narrative(text),
            None => info,
        }
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_sequence_numbers() {
        let mut buf = Vec::new();
        {
            let mut emitter = ResultEmitter::new(&mut buf, &EmitterOptions::default());
            emitter.record_success(&info("test_a", Some("First")));
            emitter.record_skipped(&info("test_b", None), "not today");
            emitter.record_unexpected_success(&info("test_c", None));
            assert_eq!(emitter.tests_run(), 3);
        }
        assert_eq!(
            output(buf),
            "ok 1 - First\n\
             skip 2 - test_b (TestableTest)\n\
             # SKIP: not today\n\
             not ok 3 - test_c (TestableTest)\n\
             # UNEXPECTED_SUCCESS: TestableTest::test_c\n"
        );
    }

    #[test]
    fn test_error_without_source() {
        let mut buf = Vec::new();
        {
            let mut emitter = ResultEmitter::new(&mut buf, &EmitterOptions::default());
            let err = TestError::new(ErrorKind::Panic, "boom")
                .at(SourceLocation::new("missing/source.rs", 7, 3));
            emitter.record_error(&info("test_boom", None), &err);
        }
        assert_eq!(
            output(buf),
            "not ok 1 - test_boom (TestableTest)\n\
             # ERROR: TestableTest::test_boom: Panic on file missing/source.rs, line 7\n"
        );
    }

    #[test]
    fn test_additional_error_keeps_sequence() {
        let mut buf = Vec::new();
        let summary = {
            let mut emitter = ResultEmitter::new(&mut buf, &EmitterOptions::default());
            let test = info("test_cleanup", None);
            let err = TestError::new(ErrorKind::Panic, "cleanup")
                .at(SourceLocation::new("missing/source.rs", 9, 1));
            emitter.record_error(&test, &err);
            emitter.record_additional_error(&test, &err);
            emitter.record_success(&info("test_next", None));
            emitter.summary()
        };
        let text = output(buf);
        assert_eq!(text.matches("# ERROR: TestableTest::test_cleanup").count(), 2);
        assert!(text.contains("ok 2 - test_next (TestableTest)"));
        assert_eq!(summary.tests_run, 2);
        assert_eq!(summary.additional_errors, 1);
        assert!(!summary.was_successful());
    }

    #[test]
    fn test_fail_fast_requests_stop() {
        let mut buf = Vec::new();
        let options = EmitterOptions {
            fail_fast: true,
            ..Default::default()
        };
        let mut emitter = ResultEmitter::new(&mut buf, &options);
        emitter.record_skipped(&info("test_a", None), "later");
        assert!(!emitter.should_stop());
        emitter.record_failure(&info("test_b", None), &TestError::new(ErrorKind::Assertion, "x"));
        assert!(emitter.should_stop());
    }

    #[test]
    fn test_without_fail_fast_never_stops() {
        let mut buf = Vec::new();
        let mut emitter = ResultEmitter::new(&mut buf, &EmitterOptions::default());
        emitter.record_error(&info("test_a", None), &TestError::new(ErrorKind::Panic, "x"));
        assert!(!emitter.should_stop());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut stream = BrokenPipe;
        let mut emitter = ResultEmitter::new(&mut stream, &EmitterOptions::default());
        emitter.record_success(&info("test_a", None));
        emitter.record_failure(&info("test_b", None), &TestError::new(ErrorKind::Assertion, "x"));
        assert_eq!(emitter.summary().tests_run, 2);
    }

    #[test]
    fn test_factory_creates_tap_emitter() {
        let mut buf = Vec::new();
        {
            let mut reporter = TapEmitterFactory.create(&mut buf, &EmitterOptions::default());
            reporter.record_success(&info("test_a", Some("Works")));
        }
        assert_eq!(output(buf), "ok 1 - Works\n");
    }
}
