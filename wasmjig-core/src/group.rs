//! Test Groups
//!
//! Groups are stored flat, in the order their `describe` opened. Each group
//! knows its parent index and depth, so reporters can rebuild the tree
//! without the model owning one.

use crate::guest::CallbackRef;
use crate::performance::{PerformanceConfig, PerformanceOverrides};
use crate::result::TestResult;
use crate::value::{LogTarget, LogValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of lifecycle hook a group can register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    /// Once before the group's first test
    BeforeAll,
    /// Once after the group's last test
    AfterAll,
    /// Before every test
    BeforeEach,
    /// After every test
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::BeforeAll => "beforeAll",
            HookKind::AfterAll => "afterAll",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
        };
        f.write_str(name)
    }
}

/// One optional callback per hook kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hooks {
    /// `beforeAll` callback
    pub before_all: Option<CallbackRef>,
    /// `afterAll` callback
    pub after_all: Option<CallbackRef>,
    /// `beforeEach` callback
    pub before_each: Option<CallbackRef>,
    /// `afterEach` callback
    pub after_each: Option<CallbackRef>,
}

impl Hooks {
    /// Store a hook; a later registration of the same kind replaces it
    pub fn set(&mut self, kind: HookKind, callback: CallbackRef) {
        *self.slot(kind) = Some(callback);
    }

    /// The registered hook of a kind
    pub fn get(&self, kind: HookKind) -> Option<CallbackRef> {
        match kind {
            HookKind::BeforeAll => self.before_all,
            HookKind::AfterAll => self.after_all,
            HookKind::BeforeEach => self.before_each,
            HookKind::AfterEach => self.after_each,
        }
    }

    fn slot(&mut self, kind: HookKind) -> &mut Option<CallbackRef> {
        match kind {
            HookKind::BeforeAll => &mut self.before_all,
            HookKind::AfterAll => &mut self.after_all,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
        }
    }
}

/// A test recorded during registration, not yet run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredTest {
    /// Test name
    pub name: String,
    /// Body to invoke
    pub callback: CallbackRef,
    /// Whether the body is expected to fail
    pub negated: bool,
    /// Message used when a negated test's body completes
    pub message: Option<String>,
    /// Settings resolved when the test was registered
    pub performance: PerformanceConfig,
}

/// One `describe` scope and, after execution, its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestGroup {
    /// Group name; empty for the implicit root
    pub name: String,
    /// Index of the enclosing group, `None` for the root
    pub parent: Option<usize>,
    /// Nesting depth, 0 for the root
    pub depth: usize,
    /// Indices of directly nested groups, in declaration order
    pub children: Vec<usize>,
    /// Conjunction of every test outcome and this group's hooks
    pub pass: bool,
    /// Why the group failed outside of a test (a hook), if it did
    pub reason: Option<String>,
    /// Tests in declaration order
    pub tests: Vec<RegisteredTest>,
    /// Hooks guarding this group's own tests
    pub hooks: Hooks,
    /// Placeholder descriptions, never run
    pub todos: Vec<String>,
    /// Settings this scope overrides
    pub performance: PerformanceOverrides,
    /// Logs recorded outside any running test
    pub logs: Vec<LogValue>,
    /// Results in declaration order
    pub results: Vec<TestResult>,
    /// Wall-clock milliseconds for the whole group
    pub run_time: f64,
}

impl TestGroup {
    /// The implicit top-level group
    pub fn root() -> Self {
        Self::new("", None, 0)
    }

    /// A new empty group
    pub fn new(name: impl Into<String>, parent: Option<usize>, depth: usize) -> Self {
        Self {
            name: name.into(),
            parent,
            depth,
            children: Vec::new(),
            pass: true,
            reason: None,
            tests: Vec::new(),
            hooks: Hooks::default(),
            todos: Vec::new(),
            performance: PerformanceOverrides::default(),
            logs: Vec::new(),
            results: Vec::new(),
            run_time: 0.0,
        }
    }

    /// Whether this is the implicit root
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the group registered nothing at all
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.todos.is_empty() && self.logs.is_empty()
    }

    /// Number of passing results
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.pass).count()
    }

    /// Number of failing results
    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// Record a hook failure
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.pass = false;
        self.reason.get_or_insert_with(|| reason.into());
    }

    /// Recompute `pass` from results, keeping any hook failure
    pub fn settle(&mut self) {
        self.pass = self.reason.is_none() && self.results.iter().all(|r| r.pass);
    }
}

impl LogTarget for TestGroup {
    fn logs(&self) -> &[LogValue] {
        &self.logs
    }

    fn push_log(&mut self, value: LogValue) {
        self.logs.push(value);
    }
}
