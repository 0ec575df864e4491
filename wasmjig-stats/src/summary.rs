//! Summary Statistics
//!
//! Reduces elapsed-time samples (milliseconds) to summary figures.
//! - Variance is the population variance (divisor = sample count)
//! - Median of an even-sized set is the mean of the two central values
//! - An empty set has no statistics at all (`None`), never zeros

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Every figure the reducer can produce, unrounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// Middle value of the sorted samples
    pub median: f64,
    /// Mean squared deviation from the mean
    pub variance: f64,
    /// Square root of the variance
    pub std_dev: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Number of samples reduced
    pub sample_count: usize,
}

/// Compute all summary figures at once.
///
/// Returns `None` for an empty sample set.
pub fn compute_summary(samples: &[f64]) -> Option<SummaryStatistics> {
    let mean = compute_mean(samples)?;
    let variance = population_variance(samples, mean);

    Some(SummaryStatistics {
        mean,
        median: compute_median(samples)?,
        variance,
        std_dev: variance.sqrt(),
        min: compute_min(samples)?,
        max: compute_max(samples)?,
        sample_count: samples.len(),
    })
}

/// Arithmetic mean of the samples
pub fn compute_mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Median of the samples
///
/// Sorts a copy ascending; for an even count the two central values are averaged.
pub fn compute_median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population variance of the samples
pub fn compute_variance(samples: &[f64]) -> Option<f64> {
    let mean = compute_mean(samples)?;
    Some(population_variance(samples, mean))
}

/// Smallest sample
pub fn compute_min(samples: &[f64]) -> Option<f64> {
    samples
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

/// Largest sample
pub fn compute_max(samples: &[f64]) -> Option<f64> {
    samples
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

fn population_variance(samples: &[f64], mean: f64) -> f64 {
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64
}
