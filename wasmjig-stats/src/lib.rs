#![warn(missing_docs)]
//! wasmjig Statistics Reducer
//!
//! Pure functions that turn the elapsed-time samples of a performance test
//! into summary figures:
//! - Arithmetic mean
//! - Median (mean of the two central values for an even count)
//! - Population variance and standard deviation
//! - Minimum and maximum
//!
//! Values are kept unrounded until presentation; [`round_to`] is applied once
//! to each reported figure.

mod precision;
mod summary;

pub use precision::{MAX_DECIMAL_PLACES, round_to};
pub use summary::{
    SummaryStatistics, compute_max, compute_mean, compute_median, compute_min, compute_summary,
    compute_variance,
};

/// Default number of decimal places reported statistics are rounded to
pub const DEFAULT_DECIMAL_PLACES: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_DECIMAL_PLACES, 3);
        assert!(MAX_DECIMAL_PLACES >= DEFAULT_DECIMAL_PLACES);
    }
}
