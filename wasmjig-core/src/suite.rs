//! Suite Results
//!
//! Everything one guest module produced: groups in declaration order plus
//! process-level warnings.

use crate::group::TestGroup;
use crate::trace::StackTrace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a process-level warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// An actual/expected report arrived while no test was running
    InvalidExpectCall,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::InvalidExpectCall => f.write_str("Invalid Expect Call"),
        }
    }
}

/// Invalid usage of the ABI; fails the module independently of tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    /// Category
    pub kind: WarningKind,
    /// Human-readable description
    pub message: String,
    /// Filtered stack of the offending call
    pub stack: StackTrace,
}

/// Results of one guest module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Source entry the module was built from
    pub file: String,
    /// Groups in declaration order; index 0 is the implicit root
    pub groups: Vec<TestGroup>,
    /// Invalid-usage warnings
    pub warnings: Vec<Warning>,
    /// No warnings and every group passed
    pub pass: bool,
    /// Wall-clock milliseconds for registration plus execution
    pub run_time: f64,
}

impl SuiteResult {
    /// An empty suite for `file`
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            groups: Vec::new(),
            warnings: Vec::new(),
            pass: true,
            run_time: 0.0,
        }
    }

    /// Recompute `pass` from groups and warnings
    pub fn settle(&mut self) {
        self.pass = self.warnings.is_empty() && self.groups.iter().all(|g| g.pass);
    }

    /// Every test result, group by group
    pub fn results(&self) -> impl Iterator<Item = &crate::result::TestResult> {
        self.groups.iter().flat_map(|g| g.results.iter())
    }

    /// Number of executed tests
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    /// Number of passing tests
    pub fn passed(&self) -> usize {
        self.groups.iter().map(TestGroup::passed).sum()
    }

    /// Number of failing tests
    pub fn failed(&self) -> usize {
        self.test_count() - self.passed()
    }

    /// Number of todos across groups
    pub fn todo_count(&self) -> usize {
        self.groups.iter().map(|g| g.todos.len()).sum()
    }

    /// Find a group by name
    pub fn group(&self, name: &str) -> Option<&TestGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}
