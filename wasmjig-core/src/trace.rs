//! Stack Trace Filtering
//!
//! Host-side stacks interleave engine frames with guest frames. Only frames
//! matching the filter (guest frames, by default anything mentioning `wasm`)
//! are kept for reporting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default frame filter: keep frames that belong to guest code
pub const DEFAULT_FRAME_FILTER: &str = "(?i)wasm";

/// Predicate selecting which frames are relevant to guest execution
#[derive(Debug, Clone)]
pub struct StackFilter {
    pattern: Option<Regex>,
}

impl StackFilter {
    /// Build a filter from a regular expression
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    /// A filter that keeps every frame
    pub fn keep_all() -> Self {
        Self { pattern: None }
    }

    /// Whether a single frame is kept
    pub fn keeps(&self, frame: &str) -> bool {
        self.pattern.as_ref().is_none_or(|re| re.is_match(frame))
    }

    /// Filter raw frames into an owned trace
    pub fn filter<I, S>(&self, frames: I) -> StackTrace
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StackTrace {
            frames: frames
                .into_iter()
                .filter(|frame| self.keeps(frame.as_ref()))
                .map(|frame| frame.as_ref().to_string())
                .collect(),
        }
    }
}

impl Default for StackFilter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_FRAME_FILTER).ok(),
        }
    }
}

/// Filtered stack frames, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackTrace {
    frames: Vec<String>,
}

impl StackTrace {
    /// The kept frames
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Whether no frame survived filtering
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "at {frame}")?;
        }
        Ok(())
    }
}
