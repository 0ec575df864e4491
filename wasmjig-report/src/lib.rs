#![warn(missing_docs)]
//! wasmjig Report - Reporters and Run Reports
//!
//! - The `Reporter` lifecycle contract and `EmptyReporter`
//! - `DefaultReporter` (human-readable) and `SummaryReporter` (one line per module)
//! - JSON run report across every module

mod human;
mod json;
mod report;
mod reporter;
mod summary;

pub use human::{DefaultReporter, format_group, format_result, format_stats, format_summary};
pub use json::generate_json_report;
pub use report::{ModuleError, ModuleErrorKind, Report, ReportMeta, RunSummary, SCHEMA_VERSION};
pub use reporter::{EmptyReporter, EventLog, Reporter};
pub use summary::SummaryReporter;

use serde::{Deserialize, Serialize};

/// Reporter selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    /// Human-readable terminal output
    #[default]
    Default,
    /// One line per module
    Summary,
    /// JSON run report written after every module ran
    Json,
    /// No output
    Empty,
}

impl std::str::FromStr for ReporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "human" | "text" => Ok(ReporterKind::Default),
            "summary" => Ok(ReporterKind::Summary),
            "json" => Ok(ReporterKind::Json),
            "empty" | "none" => Ok(ReporterKind::Empty),
            other => Err(format!("Unknown reporter: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_kind_from_str() {
        assert_eq!("human".parse::<ReporterKind>(), Ok(ReporterKind::Default));
        assert_eq!("JSON".parse::<ReporterKind>(), Ok(ReporterKind::Json));
        assert_eq!("none".parse::<ReporterKind>(), Ok(ReporterKind::Empty));
        assert!("xml".parse::<ReporterKind>().is_err());
    }
}
