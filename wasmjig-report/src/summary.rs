//! Summary Output
//!
//! One counts line per module, nothing else.

use crate::human::format_summary;
use crate::reporter::Reporter;
use std::io::{self, Write};
use wasmjig_core::SuiteResult;

/// Writes a single summary line when each module finishes
pub struct SummaryReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> SummaryReporter<W> {
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
}

impl<W: Write> Reporter for SummaryReporter<W> {
    fn on_finish(&mut self, suite: &SuiteResult) {
        if self.error.is_some() {
            return;
        }
        let line = format_summary(suite);
        if let Err(err) = self.out.write_all(line.trim_start().as_bytes()) {
            self.error = Some(err);
        }
    }
}
