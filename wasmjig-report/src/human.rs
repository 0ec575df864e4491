//! Human-Readable Output
//!
//! Terminal-friendly rendering of groups as they finish:
//! - Test results with status icons (✓/✗)
//! - Actual/expected pairs, failure message and filtered stack
//! - Logs and the statistics each test asked for
//! - Todos, warnings and a per-module summary line

use crate::reporter::Reporter;
use std::fmt::Write as _;
use std::io::{self, Write};
use wasmjig_core::{PerformanceStats, SuiteResult, TestGroup, TestResult, Warning};

/// Streams each group to a writer once it has finished
pub struct DefaultReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> DefaultReporter<W> {
    /// Report to `out`
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flush and return the writer, or the first write error
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            self.error = Some(err);
        }
    }
}

impl<W: Write> Reporter for DefaultReporter<W> {
    fn on_start(&mut self, suite: &SuiteResult) {
        self.emit(&format!("\n[File]: {}\n", suite.file));
    }

    fn on_group_finish(&mut self, group: &TestGroup) {
        if group.is_root() && group.is_empty() {
            return;
        }
        self.emit(&format_group(group));
    }

    fn on_finish(&mut self, suite: &SuiteResult) {
        let mut output = String::new();
        for warning in &suite.warnings {
            output.push_str(&format_warning(warning));
        }
        output.push_str(&format_summary(suite));
        self.emit(&output);
    }
}

/// Render a finished group with its results, logs and todos
pub fn format_group(group: &TestGroup) -> String {
    let indent = "  ".repeat(group.depth.saturating_sub(1));
    let mut output = String::new();

    let name = if group.is_root() { "(top level)" } else { &group.name };
    let _ = writeln!(output, "\n{indent}[Describe]: {name}");
    if let Some(reason) = &group.reason {
        let _ = writeln!(output, "{indent}  ✗ {reason}");
    }
    output.push('\n');

    for log in &group.logs {
        let _ = writeln!(output, "{indent}  [Log]: {}", log.message);
    }

    for result in &group.results {
        output.push_str(&format_result(result, &indent));
    }

    for todo in &group.todos {
        let _ = writeln!(output, "{indent}  ○ TODO: {todo}");
    }

    output
}

/// Render one test result
pub fn format_result(result: &TestResult, indent: &str) -> String {
    let mut output = String::new();
    let icon = if result.pass { "✓" } else { "✗" };
    let negated = if result.negated { " (expected to throw)" } else { "" };
    let _ = writeln!(
        output,
        "{indent}  {icon} {}{negated}  {:.3}ms",
        result.name, result.run_time
    );

    if !result.pass {
        let detail = format!("{indent}      ");
        if let Some(actual) = &result.actual {
            let _ = writeln!(output, "{detail}[Actual]  : {actual}");
        }
        if let Some(expected) = &result.expected {
            let _ = writeln!(output, "{detail}[Expected]: {expected}");
        }
        if let Some(message) = &result.message {
            let _ = writeln!(output, "{detail}[Message] : {message}");
        }
        if let Some(stack) = &result.stack {
            for line in stack.to_string().lines() {
                let _ = writeln!(output, "{detail}  {line}");
            }
        }
    }

    for log in &result.logs {
        let _ = writeln!(output, "{indent}      [Log]: {}", log.message);
    }

    if let Some(line) = format_stats(&result.stats, result.times.len()) {
        let _ = writeln!(output, "{indent}      {line}");
    }

    output
}

/// One line with every statistic present, or `None` when nothing was computed
pub fn format_stats(stats: &PerformanceStats, samples: usize) -> Option<String> {
    let figures = [
        ("Average", stats.average),
        ("Median", stats.median),
        ("Min", stats.min),
        ("Max", stats.max),
        ("StdDev", stats.std_dev),
        ("Variance", stats.variance),
    ];

    let parts: Vec<String> = figures
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("[{label}]: {v}ms")))
        .collect();

    if parts.is_empty() {
        return None;
    }
    Some(format!("[Samples]: {samples}  {}", parts.join("  ")))
}

fn format_warning(warning: &Warning) -> String {
    let mut output = format!("\n[Warning]: {} {}\n", warning.kind, warning.message);
    for line in warning.stack.to_string().lines() {
        let _ = writeln!(output, "  {line}");
    }
    output
}

/// Counts line for one module
pub fn format_summary(suite: &SuiteResult) -> String {
    let status = if suite.pass { "PASS" } else { "FAIL" };
    format!(
        "\n[{status}] {}: {} passed, {} failed, {} todo, {} warnings ({:.3}ms)\n",
        suite.file,
        suite.passed(),
        suite.failed(),
        suite.todo_count(),
        suite.warnings.len(),
        suite.run_time
    )
}
