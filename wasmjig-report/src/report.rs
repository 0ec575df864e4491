//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wasmjig_core::SuiteResult;

/// Current JSON schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Complete run report across every module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub suites: Vec<SuiteResult>,
    pub errors: Vec<ModuleError>,
    pub summary: RunSummary,
}

impl Report {
    /// Assemble a report stamped with the current time
    pub fn new(suites: Vec<SuiteResult>, errors: Vec<ModuleError>, duration_ms: f64) -> Self {
        let summary = RunSummary::from_suites(&suites, &errors, duration_ms);
        Self {
            meta: ReportMeta::now(),
            suites,
            errors,
            summary,
        }
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub schema_version: u32,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl ReportMeta {
    /// Metadata for a report generated now
    pub fn now() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Stage at which a module failed before producing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleErrorKind {
    /// The compiler rejected the entry
    Compile,
    /// The compiler succeeded but emitted no binary
    MissingBinary,
    /// The runtime could not instantiate the binary
    Instantiate,
    /// Registration was malformed (unbalanced groups, top-level trap)
    Context,
}

/// A module-level fatal error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleError {
    pub file: String,
    pub kind: ModuleErrorKind,
    pub message: String,
}

/// Run totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files: usize,
    pub groups: usize,
    pub groups_passed: usize,
    pub tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub todos: usize,
    pub warnings: usize,
    pub errors: usize,
    pub total_duration_ms: f64,
}

impl RunSummary {
    /// Totals over every module
    pub fn from_suites(suites: &[SuiteResult], errors: &[ModuleError], duration_ms: f64) -> Self {
        let mut summary = RunSummary {
            files: suites.len() + errors.len(),
            errors: errors.len(),
            total_duration_ms: duration_ms,
            ..Default::default()
        };

        for suite in suites {
            summary.groups += suite.groups.len();
            summary.groups_passed += suite.groups.iter().filter(|g| g.pass).count();
            summary.tests += suite.test_count();
            summary.passed += suite.passed();
            summary.failed += suite.failed();
            summary.todos += suite.todo_count();
            summary.warnings += suite.warnings.len();
        }

        summary
    }

    /// No failing tests or groups, no warnings and no module errors
    pub fn success(&self) -> bool {
        self.failed == 0
            && self.groups_passed == self.groups
            && self.warnings == 0
            && self.errors == 0
    }
}
