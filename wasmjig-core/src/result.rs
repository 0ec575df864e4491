//! Test Results
//!
//! One `TestResult` per executed (or hook-skipped) test. Statistics are
//! `Option`s so "not computed" never reads as zero.

use crate::performance::PerformanceConfig;
use crate::trace::StackTrace;
use crate::value::{ActualValue, LogTarget, LogValue};
use serde::{Deserialize, Serialize};
use wasmjig_stats::{compute_max, compute_mean, compute_median, compute_min, compute_variance, round_to};

/// Reported timing statistics, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Arithmetic mean
    pub average: Option<f64>,
    /// Median (mean of the two central values for an even count)
    pub median: Option<f64>,
    /// Population variance
    pub variance: Option<f64>,
    /// Square root of the unrounded variance
    pub std_dev: Option<f64>,
    /// Fastest sample
    pub min: Option<f64>,
    /// Slowest sample
    pub max: Option<f64>,
}

impl PerformanceStats {
    /// Reduce `times` to the statistics `config` asks for.
    ///
    /// Everything is `None` when sampling is disabled or no sample exists.
    /// Each figure is rounded once, after every figure derived from it has
    /// been computed.
    pub fn compute(times: &[f64], config: &PerformanceConfig) -> Self {
        if !config.enabled || times.is_empty() {
            return Self::default();
        }

        let places = config.round_decimal_places;
        let round = |value: Option<f64>| value.map(|v| round_to(v, places));
        let raw_variance = if config.report_variance || config.report_std_dev {
            compute_variance(times)
        } else {
            None
        };

        Self {
            average: round(config.report_average.then(|| compute_mean(times)).flatten()),
            median: round(config.report_median.then(|| compute_median(times)).flatten()),
            variance: round(raw_variance.filter(|_| config.report_variance)),
            std_dev: round(raw_variance.filter(|_| config.report_std_dev).map(f64::sqrt)),
            min: round(config.report_min.then(|| compute_min(times)).flatten()),
            max: round(config.report_max.then(|| compute_max(times)).flatten()),
        }
    }

    /// Whether any statistic is present
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name as registered
    pub name: String,
    /// Whether the test passed (after negation is applied)
    pub pass: bool,
    /// Whether the test expected its body to fail
    pub negated: bool,
    /// Elapsed milliseconds per sampling iteration; empty unless sampled
    pub times: Vec<f64>,
    /// Resolved sampling settings the test ran with
    pub performance: PerformanceConfig,
    /// Reduced statistics
    pub stats: PerformanceStats,
    /// Last reported actual value
    pub actual: Option<ActualValue>,
    /// Last reported expected value
    pub expected: Option<ActualValue>,
    /// Failure message
    pub message: Option<String>,
    /// Filtered stack of the failure
    pub stack: Option<StackTrace>,
    /// Logs recorded while the test ran, in call order
    pub logs: Vec<LogValue>,
    /// Wall-clock milliseconds for the whole test including hooks
    pub run_time: f64,
}

impl TestResult {
    /// An empty passing result for a test about to run
    pub fn new(name: impl Into<String>, negated: bool, performance: PerformanceConfig) -> Self {
        Self {
            name: name.into(),
            pass: true,
            negated,
            times: Vec::new(),
            performance,
            stats: PerformanceStats::default(),
            actual: None,
            expected: None,
            message: None,
            stack: None,
            logs: Vec::new(),
            run_time: 0.0,
        }
    }

    /// Mark failed with a message and optional stack
    pub fn fail(&mut self, message: impl Into<String>, stack: Option<StackTrace>) {
        self.pass = false;
        self.message = Some(message.into());
        self.stack = stack.filter(|s| !s.is_empty());
    }

    /// Store samples and reduce them under the test's own settings
    pub fn record_samples(&mut self, times: Vec<f64>) {
        self.stats = PerformanceStats::compute(&times, &self.performance);
        self.times = times;
    }

    /// Whether statistics were computed
    pub fn has_stats(&self) -> bool {
        !self.stats.is_empty()
    }
}

impl LogTarget for TestResult {
    fn logs(&self) -> &[LogValue] {
        &self.logs
    }

    fn push_log(&mut self, value: LogValue) {
        self.logs.push(value);
    }
}
