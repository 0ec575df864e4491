//! Entry Planner
//!
//! Turns the configured globs into the ordered list of entry files to compile.
//!
//! ```text
//! include globs ──► candidates ──► drop `disclude` matches ──► keep `--file` matches
//!                                                                      │
//!                                                          sorted, deduplicated
//! add globs ──► files compiled alongside every entry
//! ```

use regex::Regex;
use std::path::{Path, PathBuf};

/// Files selected for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPlan {
    /// Test entry files, one module each
    pub entries: Vec<PathBuf>,
    /// Files passed to the compiler with every entry
    pub added: Vec<PathBuf>,
}

impl EntryPlan {
    /// Whether nothing would run
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Expand glob patterns relative to `root`, keeping regular files only
pub fn resolve_globs(patterns: &[String], root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            root.join(pattern)
        };
        let full = full.to_string_lossy();
        for path in glob::glob(&full)?.flatten() {
            if path.is_file() {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Filter candidate entries and put them in deterministic order
pub fn build_plan(
    candidates: impl IntoIterator<Item = PathBuf>,
    disclude: &[Regex],
    file_filter: Option<&Regex>,
) -> Vec<PathBuf> {
    let mut selected: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| {
            let text = path.to_string_lossy();

            if disclude.iter().any(|re| re.is_match(&text)) {
                return false;
            }

            if let Some(re) = file_filter {
                if !re.is_match(&text) {
                    return false;
                }
            }

            true
        })
        .collect();

    selected.sort();
    selected.dedup();
    selected
}

/// Resolve both glob lists and build the plan
pub fn plan_entries(
    include: &[String],
    add: &[String],
    disclude: &[Regex],
    file_filter: Option<&Regex>,
    root: &Path,
) -> anyhow::Result<EntryPlan> {
    let entries = build_plan(resolve_globs(include, root)?, disclude, file_filter);
    let mut added = resolve_globs(add, root)?;
    added.sort();
    added.dedup();
    // An entry never doubles as an added file
    added.retain(|path| !entries.contains(path));

    tracing::debug!(entries = entries.len(), added = added.len(), "Planned entries");
    Ok(EntryPlan { entries, added })
}
