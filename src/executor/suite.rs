//! Test suite definitions
//!
//! Test cases, groups of them, fixtures and the per-test context handed to
//! bodies, fixtures and cleanups.

use std::fmt;

use crate::models::{TestError, TestId, TestInfo};

/// Why a test part stopped early
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// The test asked to be skipped
    Skip(String),
    /// The test raised an error
    Raise(TestError),
}

impl From<TestError> for Interrupt {
    fn from(error: TestError) -> Self {
        Interrupt::Raise(error)
    }
}

/// Any error propagated with `?` is raised at the `?` site
impl<E: std::error::Error> From<E> for Interrupt {
    #[track_caller]
    fn from(error: E) -> Self {
        Interrupt::Raise(TestError::from_error(&error))
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Skip(reason) => write!(f, "skipped: {reason}"),
            Interrupt::Raise(error) => write!(f, "{error}"),
        }
    }
}

/// Result of a test body, fixture or cleanup
pub type TestResult = Result<(), Interrupt>;

type Body = Box<dyn Fn(&mut TestContext) -> TestResult>;
type Cleanup = Box<dyn FnOnce(&mut TestContext) -> TestResult>;

/// Per-test state: registered cleanups plus assertion helpers
#[derive(Default)]
pub struct TestContext {
    cleanups: Vec<Cleanup>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback to run after the test, last registered first
    pub fn add_cleanup(&mut self, cleanup: impl FnOnce(&mut TestContext) -> TestResult + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }

    /// Run every cleanup in reverse registration order, including cleanups
    /// registered while cleaning up. Returns the errors they raised, in order.
    pub fn do_cleanups(&mut self) -> Vec<TestError> {
        let mut errors = Vec::new();
        while let Some(cleanup) = self.cleanups.pop() {
            match super::capture::catch_panic(|| cleanup(self)) {
                Ok(Ok(())) | Ok(Err(Interrupt::Skip(_))) => {}
                Ok(Err(Interrupt::Raise(error))) | Err(error) => errors.push(error),
            }
        }
        errors
    }

    /// Skip the rest of the test
    pub fn skip(&self, reason: impl Into<String>) -> Interrupt {
        Interrupt::Skip(reason.into())
    }

    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) -> Interrupt {
        Interrupt::Raise(TestError::assertion(message))
    }

    #[track_caller]
    pub fn assert_true(&self, condition: bool) -> Result<(), TestError> {
        if condition {
            Ok(())
        } else {
            Err(TestError::assertion("false is not true"))
        }
    }

    #[track_caller]
    pub fn assert_false(&self, condition: bool) -> Result<(), TestError> {
        if condition {
            Err(TestError::assertion("true is not false"))
        } else {
            Ok(())
        }
    }

    #[track_caller]
    pub fn assert_eq<T: PartialEq + fmt::Debug>(&self, left: T, right: T) -> Result<(), TestError> {
        if left == right {
            Ok(())
        } else {
            Err(TestError::assertion(format!("{left:?} != {right:?}")))
        }
    }

    #[track_caller]
    pub fn assert_ne<T: PartialEq + fmt::Debug>(&self, left: T, right: T) -> Result<(), TestError> {
        if left != right {
            Ok(())
        } else {
            Err(TestError::assertion(format!("{left:?} == {right:?}")))
        }
    }
}

/// A single test case
pub struct TestCase {
    method: String,
    narrative: Option<String>,
    body: Body,
    skip: Option<String>,
    expected_failure: bool,
}

impl TestCase {
    pub fn new(
        method: impl Into<String>,
        body: impl Fn(&mut TestContext) -> TestResult + 'static,
    ) -> Self {
        Self {
            method: method.into(),
            narrative: None,
            body: Box::new(body),
            skip: None,
            expected_failure: false,
        }
    }

    /// Attach narrative text; its first line becomes the description
    pub fn narrative(mut self, text: impl Into<String>) -> Self {
        self.narrative = Some(text.into());
        self
    }

    /// Never run this test, reporting it skipped with `reason`
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Skip when `condition` holds
    pub fn skip_if(self, condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            self.skip(reason)
        } else {
            self
        }
    }

    /// Declare this test as known to fail
    pub fn expected_failure(mut self) -> Self {
        self.expected_failure = true;
        self
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip.as_deref()
    }

    pub fn is_expected_failure(&self) -> bool {
        self.expected_failure
    }

    pub(crate) fn call(&self, ctx: &mut TestContext) -> TestResult {
        (self.body)(ctx)
    }

    pub fn info(&self, path: &[String]) -> TestInfo {
        let info = TestInfo::new(TestId::new(path.to_vec(), &self.method));
        match &self.narrative {
            Some(text) => info.with_narrative(text.clone()),
            None => info,
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("method", &self.method)
            .field("narrative", &self.narrative)
            .field("skip", &self.skip)
            .field("expected_failure", &self.expected_failure)
            .finish_non_exhaustive()
    }
}

/// Member of a suite
#[derive(Debug)]
pub enum Entry {
    Case(TestCase),
    Suite(Suite),
}

/// A named group of tests sharing fixtures
pub struct Suite {
    name: String,
    set_up: Option<Body>,
    tear_down: Option<Body>,
    entries: Vec<Entry>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_up: None,
            tear_down: None,
            entries: Vec::new(),
        }
    }

    /// Fixture run before each direct test case
    pub fn set_up(mut self, f: impl Fn(&mut TestContext) -> TestResult + 'static) -> Self {
        self.set_up = Some(Box::new(f));
        self
    }

    /// Fixture run after each direct test case whose set-up succeeded
    pub fn tear_down(mut self, f: impl Fn(&mut TestContext) -> TestResult + 'static) -> Self {
        self.tear_down = Some(Box::new(f));
        self
    }

    pub fn case(mut self, case: TestCase) -> Self {
        self.entries.push(Entry::Case(case));
        self
    }

    /// Shorthand for a plain test case
    pub fn test(
        self,
        method: impl Into<String>,
        body: impl Fn(&mut TestContext) -> TestResult + 'static,
    ) -> Self {
        self.case(TestCase::new(method, body))
    }

    pub fn suite(mut self, suite: Suite) -> Self {
        self.entries.push(Entry::Suite(suite));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of scheduled tests, nested suites included
    pub fn count_tests(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Case(_) => 1,
                Entry::Suite(suite) => suite.count_tests(),
            })
            .sum()
    }

    /// Keep only tests whose identity contains `pattern`
    pub fn filter(self, pattern: &str) -> Self {
        self.filter_at(&[], pattern)
    }

    fn filter_at(mut self, parent: &[String], pattern: &str) -> Self {
        let mut path = parent.to_vec();
        path.push(self.name.clone());

        self.entries = std::mem::take(&mut self.entries)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Case(case) => case
                    .info(&path)
                    .id
                    .identity()
                    .contains(pattern)
                    .then_some(Entry::Case(case)),
                Entry::Suite(suite) => {
                    let suite = suite.filter_at(&path, pattern);
                    (suite.count_tests() > 0).then_some(Entry::Suite(suite))
                }
            })
            .collect();
        self
    }

    pub(crate) fn call_set_up(&self, ctx: &mut TestContext) -> TestResult {
        match &self.set_up {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    pub(crate) fn call_tear_down(&self, ctx: &mut TestContext) -> TestResult {
        match &self.tear_down {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_cleanups_run_in_reverse_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = TestContext::new();
        for n in 1..=3 {
            let order = order.clone();
            ctx.add_cleanup(move |_| {
                order.borrow_mut().push(n);
                Ok(())
            });
        }

        assert!(ctx.do_cleanups().is_empty());
        assert_eq!(*order.borrow(), vec![3, 2, 1]);
        assert_eq!(ctx.pending_cleanups(), 0);
    }

    #[test]
    fn test_cleanup_errors_do_not_stop_others() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = TestContext::new();

        let first = order.clone();
        ctx.add_cleanup(move |_| {
            first.borrow_mut().push("cleanup1");
            Err(TestError::new(ErrorKind::Custom("Exception".into()), "foo").into())
        });
        let second = order.clone();
        ctx.add_cleanup(move |_| {
            second.borrow_mut().push("cleanup2");
            panic!("bar");
        });

        let errors = ctx.do_cleanups();
        assert_eq!(*order.borrow(), vec!["cleanup2", "cleanup1"]);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "bar");
        assert_eq!(errors[1].message, "foo");
    }

    #[test]
    fn test_cleanup_registered_during_cleanup_runs() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut ctx = TestContext::new();

        let outer = order.clone();
        ctx.add_cleanup(move |ctx| {
            outer.borrow_mut().push("cleanup1");
            let inner = outer.clone();
            ctx.add_cleanup(move |_| {
                inner.borrow_mut().push("cleanup2");
                Ok(())
            });
            Ok(())
        });

        assert!(ctx.do_cleanups().is_empty());
        assert_eq!(*order.borrow(), vec!["cleanup1", "cleanup2"]);
    }

    #[test]
    fn test_assertions_record_caller() {
        let ctx = TestContext::new();
        assert!(ctx.assert_true(true).is_ok());
        assert!(ctx.assert_eq(1, 1).is_ok());
        assert!(ctx.assert_ne(1, 2).is_ok());

        let line = line!() + 1;
        let err = ctx.assert_false(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Assertion);
        assert_eq!(err.raise_site().unwrap().line, line);

        let err = ctx.assert_eq("a", "b").unwrap_err();
        assert_eq!(err.message, "\"a\" != \"b\"");
    }

    #[test]
    fn test_question_mark_converts_errors() {
        fn body() -> TestResult {
            let _: i32 = "nope".parse()?;
            Ok(())
        }

        match body() {
            Err(Interrupt::Raise(err)) => {
                assert_eq!(err.kind.name(), "ParseIntError");
                assert_eq!(err.raise_site().unwrap().file, file!());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_count_and_filter() {
        let suite = Suite::new("outer")
            .test("test_a", |_| Ok(()))
            .suite(
                Suite::new("inner")
                    .test("test_b", |_| Ok(()))
                    .test("test_c", |_| Ok(())),
            );
        assert_eq!(suite.count_tests(), 3);

        let filtered = suite.filter("inner::test_c");
        assert_eq!(filtered.count_tests(), 1);
        assert_eq!(filtered.entries().len(), 1);
    }

    #[test]
    fn test_case_info() {
        let case = TestCase::new("test_x", |_| Ok(())).narrative("Does x\nand more");
        let info = case.info(&["Group".to_string()]);
        assert_eq!(info.id.identity(), "Group::test_x");
        assert_eq!(info.description(), "Does x");
    }

    #[test]
    fn test_skip_if() {
        let case = TestCase::new("t", |_| Ok(())).skip_if(false, "no");
        assert!(case.skip_reason().is_none());
        let case = TestCase::new("t", |_| Ok(())).skip_if(true, "yes");
        assert_eq!(case.skip_reason(), Some("yes"));
    }
}
