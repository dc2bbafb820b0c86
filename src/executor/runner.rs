//! Test execution runner
//!
//! Binds an emitter to the output stream, runs a suite through the engine and
//! closes the stream with the TAP plan line.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use super::engine::run_suite;
use super::suite::Suite;
use crate::config::RunnerConfig;
use crate::models::RunSummary;
use crate::output::{
    write_summary_to_file, ColorMode, EmitterFactory, EmitterOptions, LineFormatter,
    TapEmitterFactory,
};

/// Errors the runner itself can hit; test errors never surface here
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to write plan line: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write run summary: {0:#}")]
    Summary(anyhow::Error),
}

/// TAP test runner
pub struct TapTestRunner<W: Write = io::Stdout> {
    stream: W,
    config: RunnerConfig,
    stream_is_terminal: bool,
    emitter: Box<dyn EmitterFactory>,
}

impl TapTestRunner<io::Stdout> {
    /// Runner writing to standard output
    pub fn new() -> Self {
        let stream = io::stdout();
        let stream_is_terminal = stream.is_terminal();
        Self {
            stream,
            config: RunnerConfig::default(),
            stream_is_terminal,
            emitter: Box::new(TapEmitterFactory),
        }
    }
}

impl Default for TapTestRunner<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TapTestRunner<W> {
    /// Write to `stream` instead. Automatic color is off for it.
    pub fn with_stream<V: Write>(self, stream: V) -> TapTestRunner<V> {
        TapTestRunner {
            stream,
            config: self.config,
            stream_is_terminal: false,
            emitter: self.emitter,
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    pub fn buffer(mut self, buffer: bool) -> Self {
        self.config.buffer = buffer;
        self
    }

    pub fn descriptions(mut self, descriptions: bool) -> Self {
        self.config.descriptions = descriptions;
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    pub fn color(mut self, color: ColorMode) -> Self {
        self.config.color = color;
        self
    }

    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.source_root = Some(root.into());
        self
    }

    /// Skip frames under `prefix` when locating the failing line, e.g. a
    /// shared helper module
    pub fn exclude(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.config.exclude.push(prefix.into());
        self
    }

    pub fn summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.summary_path = Some(path.into());
        self
    }

    /// Use a different reporter for the results
    pub fn with_emitter(mut self, factory: impl EmitterFactory + 'static) -> Self {
        self.emitter = Box::new(factory);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn into_stream(self) -> W {
        self.stream
    }

    fn emitter_options(&self) -> EmitterOptions {
        EmitterOptions {
            color: self.config.color.enabled(self.stream_is_terminal),
            fail_fast: self.config.fail_fast,
            buffer: self.config.buffer,
            descriptions: self.config.descriptions,
            verbosity: self.config.verbosity,
            source_root: self.config.source_root.clone(),
            exclude: self.config.exclude.clone(),
        }
    }

    /// Run `suite` and write its TAP stream, ending with the plan line
    pub fn run(&mut self, suite: &Suite) -> Result<RunSummary, RunError> {
        let options = self.emitter_options();
        info!(
            "Running suite '{}' with {} tests",
            suite.name(),
            suite.count_tests()
        );

        let summary = {
            let mut reporter = self.emitter.create(&mut self.stream, &options);
            reporter.start_test_run();
            run_suite(suite, reporter.as_mut());
            reporter.stop_test_run();
            reporter.summary()
        };

        writeln!(
            self.stream,
            "{}",
            LineFormatter::plain().plan_line(summary.tests_run)
        )?;
        self.stream.flush()?;

        if let Some(path) = &self.config.summary_path {
            write_summary_to_file(path, &summary).map_err(RunError::Summary)?;
            info!("Summary written to {}", path.display());
        }

        info!("{}", summary);
        Ok(summary)
    }
}
