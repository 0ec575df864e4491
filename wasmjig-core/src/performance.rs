//! Performance Configuration
//!
//! Sampling settings resolve per test through three layers, nearest first:
//!
//! ```text
//! next-test override (set just before registration)
//!        │ unset fields fall through
//!        ▼
//! enclosing groups, innermost → root
//!        │
//!        ▼
//! process-wide defaults (PerformanceConfig)
//! ```
//!
//! Each field resolves independently.

use serde::{Deserialize, Serialize};

/// Fully resolved sampling settings for one test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Collect timing samples for the test
    pub enabled: bool,
    /// Stop after this many samples
    pub max_samples: u32,
    /// Stop once this many milliseconds have elapsed (after at least one sample)
    pub max_test_run_time: f64,
    /// Decimal places reported statistics are rounded to
    pub round_decimal_places: u32,
    /// Report the mean
    pub report_average: bool,
    /// Report the median
    pub report_median: bool,
    /// Report the standard deviation
    pub report_std_dev: bool,
    /// Report the slowest sample
    pub report_max: bool,
    /// Report the fastest sample
    pub report_min: bool,
    /// Report the variance
    pub report_variance: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_samples: 10_000,
            max_test_run_time: 2_000.0,
            round_decimal_places: wasmjig_stats::DEFAULT_DECIMAL_PLACES,
            report_average: true,
            report_median: true,
            report_std_dev: false,
            report_max: false,
            report_min: false,
            report_variance: false,
        }
    }
}

/// A single setting, as set by the guest or the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerformanceOption {
    /// Enable sampling
    Enabled(bool),
    /// Maximum sample count
    MaxSamples(u32),
    /// Time budget in milliseconds
    MaxTestRunTime(f64),
    /// Rounding precision
    RoundDecimalPlaces(u32),
    /// Report the mean
    ReportAverage(bool),
    /// Report the median
    ReportMedian(bool),
    /// Report the standard deviation
    ReportStdDev(bool),
    /// Report the maximum
    ReportMax(bool),
    /// Report the minimum
    ReportMin(bool),
    /// Report the variance
    ReportVariance(bool),
}

impl PerformanceOption {
    /// Decode the numeric option id used by the generic ABI setters.
    ///
    /// Ids: 0 enabled, 1 max samples, 2 max run time, 3 decimal places,
    /// 4 average, 5 median, 6 std-dev, 7 max, 8 min, 9 variance.
    /// Flags are true for any non-zero value; counts saturate into range.
    pub fn from_id(id: i32, value: f64) -> Option<Self> {
        let flag = value != 0.0;
        let count = value as u32;
        Some(match id {
            0 => PerformanceOption::Enabled(flag),
            1 => PerformanceOption::MaxSamples(count),
            2 => PerformanceOption::MaxTestRunTime(value.max(0.0)),
            3 => PerformanceOption::RoundDecimalPlaces(count),
            4 => PerformanceOption::ReportAverage(flag),
            5 => PerformanceOption::ReportMedian(flag),
            6 => PerformanceOption::ReportStdDev(flag),
            7 => PerformanceOption::ReportMax(flag),
            8 => PerformanceOption::ReportMin(flag),
            9 => PerformanceOption::ReportVariance(flag),
            _ => return None,
        })
    }
}

/// Sparse settings for one scope; `None` defers to the enclosing scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOverrides {
    /// Sampling on or off
    pub enabled: Option<bool>,
    /// Sample cap
    pub max_samples: Option<u32>,
    /// Time budget in milliseconds
    pub max_test_run_time: Option<f64>,
    /// Rounding precision
    pub round_decimal_places: Option<u32>,
    /// Report the mean
    pub report_average: Option<bool>,
    /// Report the median
    pub report_median: Option<bool>,
    /// Report the standard deviation
    pub report_std_dev: Option<bool>,
    /// Report the maximum
    pub report_max: Option<bool>,
    /// Report the minimum
    pub report_min: Option<bool>,
    /// Report the variance
    pub report_variance: Option<bool>,
}

impl PerformanceOverrides {
    /// Set one field; a later set of the same field wins
    pub fn set(&mut self, option: PerformanceOption) {
        match option {
            PerformanceOption::Enabled(v) => self.enabled = Some(v),
            PerformanceOption::MaxSamples(v) => self.max_samples = Some(v),
            PerformanceOption::MaxTestRunTime(v) => self.max_test_run_time = Some(v),
            PerformanceOption::RoundDecimalPlaces(v) => self.round_decimal_places = Some(v),
            PerformanceOption::ReportAverage(v) => self.report_average = Some(v),
            PerformanceOption::ReportMedian(v) => self.report_median = Some(v),
            PerformanceOption::ReportStdDev(v) => self.report_std_dev = Some(v),
            PerformanceOption::ReportMax(v) => self.report_max = Some(v),
            PerformanceOption::ReportMin(v) => self.report_min = Some(v),
            PerformanceOption::ReportVariance(v) => self.report_variance = Some(v),
        }
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Field-wise: keep `self` where set, otherwise take `outer`
    pub fn or(self, outer: &PerformanceOverrides) -> Self {
        Self {
            enabled: self.enabled.or(outer.enabled),
            max_samples: self.max_samples.or(outer.max_samples),
            max_test_run_time: self.max_test_run_time.or(outer.max_test_run_time),
            round_decimal_places: self.round_decimal_places.or(outer.round_decimal_places),
            report_average: self.report_average.or(outer.report_average),
            report_median: self.report_median.or(outer.report_median),
            report_std_dev: self.report_std_dev.or(outer.report_std_dev),
            report_max: self.report_max.or(outer.report_max),
            report_min: self.report_min.or(outer.report_min),
            report_variance: self.report_variance.or(outer.report_variance),
        }
    }

    /// Fill unset fields from `base`
    pub fn apply_to(&self, base: &PerformanceConfig) -> PerformanceConfig {
        PerformanceConfig {
            enabled: self.enabled.unwrap_or(base.enabled),
            max_samples: self.max_samples.unwrap_or(base.max_samples),
            max_test_run_time: self.max_test_run_time.unwrap_or(base.max_test_run_time),
            round_decimal_places: self.round_decimal_places.unwrap_or(base.round_decimal_places),
            report_average: self.report_average.unwrap_or(base.report_average),
            report_median: self.report_median.unwrap_or(base.report_median),
            report_std_dev: self.report_std_dev.unwrap_or(base.report_std_dev),
            report_max: self.report_max.unwrap_or(base.report_max),
            report_min: self.report_min.unwrap_or(base.report_min),
            report_variance: self.report_variance.unwrap_or(base.report_variance),
        }
    }

    /// Resolve layers (nearest scope first) against the defaults
    pub fn resolve<'a>(
        layers: impl IntoIterator<Item = &'a PerformanceOverrides>,
        defaults: &PerformanceConfig,
    ) -> PerformanceConfig {
        layers
            .into_iter()
            .fold(PerformanceOverrides::default(), |acc, layer| acc.or(layer))
            .apply_to(defaults)
    }
}
