//! Presentation Rounding
//!
//! Statistics are rounded exactly once, right before they are stored on a
//! result for reporting. Intermediate values never pass through here.

/// Largest precision honoured; `f64` carries roughly 15 significant digits.
pub const MAX_DECIMAL_PLACES: u32 = 15;

/// Round `value` to `places` decimal places (half away from zero).
///
/// Precision above [`MAX_DECIMAL_PLACES`] is clamped. Non-finite values are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// # use wasmjig_stats::round_to;
/// assert_eq!(round_to(2.34567, 3), 2.346);
/// assert_eq!(round_to(2.5, 0), 3.0);
/// ```
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10f64.powi(places.min(MAX_DECIMAL_PLACES) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }

    scaled.round() / factor
}
