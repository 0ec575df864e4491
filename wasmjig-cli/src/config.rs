//! Configuration loading from wasmjig.toml
//!
//! wasmjig configuration can be specified in a `wasmjig.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use wasmjig_core::{DEFAULT_FRAME_FILTER, PerformanceConfig, PerformanceOverrides, StackFilter};
use wasmjig_report::ReporterKind;

/// File name looked for during discovery
pub const CONFIG_FILE: &str = "wasmjig.toml";

/// wasmjig configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmjigConfig {
    /// Globs selecting test entry files
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Globs selecting files compiled alongside every entry
    #[serde(default = "default_add")]
    pub add: Vec<String>,
    /// Regular expressions; matching entry paths are skipped
    #[serde(default)]
    pub disclude: Vec<String>,
    /// Compiler flags, each with its values
    #[serde(default = "default_flags")]
    pub flags: BTreeMap<String, Vec<String>>,
    /// Guest imports file for entries without a `<stem>.imports.*` companion
    #[serde(default)]
    pub imports: Option<PathBuf>,
    /// Performance defaults layered over the built-in ones
    #[serde(default)]
    pub performance: PerformanceOverrides,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Stack trace configuration
    #[serde(default)]
    pub stack: StackConfig,
}

impl Default for WasmjigConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            add: default_add(),
            disclude: Vec::new(),
            flags: default_flags(),
            imports: None,
            performance: PerformanceOverrides::default(),
            output: OutputConfig::default(),
            stack: StackConfig::default(),
        }
    }
}

fn default_include() -> Vec<String> {
    vec!["assembly/__tests__/**/*.spec.ts".to_string()]
}
fn default_add() -> Vec<String> {
    vec!["assembly/__tests__/**/*.include.ts".to_string()]
}
fn default_flags() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("--validate".to_string(), Vec::new()),
        ("--debug".to_string(), Vec::new()),
        ("--binaryFile".to_string(), vec!["output.wasm".to_string()]),
    ])
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Reporter: "default", "summary", "json" or "empty"
    #[serde(default)]
    pub reporter: ReporterKind,
    /// Write output here instead of stdout
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Stack trace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Frames not matching this regex are dropped from reported stacks
    #[serde(default = "default_frame_filter")]
    pub frame_filter: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            frame_filter: default_frame_filter(),
        }
    }
}

fn default_frame_filter() -> String {
    DEFAULT_FRAME_FILTER.to_string()
}

impl WasmjigConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find `wasmjig.toml` in `start` or any of its ancestors
    pub fn find(start: impl AsRef<Path>) -> Option<PathBuf> {
        let mut dir = start.as_ref().to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::find(dir).and_then(|path| Self::load(path).ok())
    }

    /// Built-in performance defaults with the `[performance]` section applied
    pub fn performance_defaults(&self) -> PerformanceConfig {
        self.performance.apply_to(&PerformanceConfig::default())
    }

    /// Compiled `[stack] frame_filter`
    pub fn stack_filter(&self) -> anyhow::Result<StackFilter> {
        StackFilter::new(&self.stack.frame_filter).map_err(|e| {
            anyhow::anyhow!("Invalid frame_filter {:?}: {}", self.stack.frame_filter, e)
        })
    }

    /// Compiled `disclude` patterns
    pub fn disclude_patterns(&self) -> anyhow::Result<Vec<Regex>> {
        self.disclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| anyhow::anyhow!("Invalid disclude pattern {:?}: {}", pattern, e))
            })
            .collect()
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# wasmjig Configuration

# Globs selecting the test entry files; each entry is compiled into its own module
include = ["assembly/__tests__/**/*.spec.ts"]
# Globs of files compiled alongside every entry
add = ["assembly/__tests__/**/*.include.ts"]
# Regular expressions; entry paths matching any of them are skipped
disclude = ["node_modules"]
# Guest imports for entries without a <entry stem>.imports.* file next to them
# imports = "assembly/__tests__/imports.js"

[flags]
# Compiler flags and their values; make sure a binary is emitted
"--validate" = []
"--debug" = []
"--binaryFile" = ["output.wasm"]

[performance]
# Sample every test (each group can still override this)
enabled = false
# Stop after this many samples
max_samples = 10000
# Stop after this many milliseconds (at least one sample is always taken)
max_test_run_time = 2000.0
# Decimal places reported statistics are rounded to
round_decimal_places = 3
# Statistics to report
report_average = true
report_median = true
report_std_dev = false
report_max = false
report_min = false
report_variance = false

[output]
# Reporter: default, summary, json, empty
reporter = "default"
# Write output to a file instead of stdout (uncomment to enable)
# file = "target/wasmjig/report.json"

[stack]
# Frames not matching this regex are dropped from reported stacks
frame_filter = "(?i)wasm"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to milliseconds.
    ///
    /// A bare number is taken as milliseconds.
    pub fn parse_duration_ms(s: &str) -> anyhow::Result<f64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "ms"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if value < 0.0 || !value.is_finite() {
            return Err(anyhow::anyhow!("Duration must be a non-negative number: {}", s));
        }

        let multiplier = match unit_part.to_lowercase().as_str() {
            "ns" => 1e-6,
            "us" | "µs" => 1e-3,
            "ms" => 1.0,
            "s" => 1_000.0,
            "m" | "min" => 60_000.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(value * multiplier)
    }
}
