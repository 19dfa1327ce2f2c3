/// Sentinel shown wherever a ratio or average has nothing to divide by.
pub const NOT_APPLICABLE: &str = "N/A";

/// Format a value with exactly one decimal place.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_one_decimal;
///
/// assert_eq!(format_one_decimal(12.0), "12.0");
/// assert_eq!(format_one_decimal(0.04), "0.0");
/// assert_eq!(format_one_decimal(-3.26), "-3.3");
/// ```
pub fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

/// Calculate `(part / whole) * 100` without rounding.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::percentage;
///
/// assert!((percentage(1, 3) - 33.333_333).abs() < 1e-5);
/// assert_eq!(percentage(5, 0), 0.0);
/// ```
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Format `part / whole` as a percentage string such as `"25.0%"`.
///
/// An empty `whole` yields [`NOT_APPLICABLE`] rather than `"0.0%"`, so callers
/// can tell "nothing to measure" apart from a measured zero.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_rate;
///
/// assert_eq!(format_rate(1, 4), "25.0%");
/// assert_eq!(format_rate(0, 4), "0.0%");
/// assert_eq!(format_rate(0, 0), "N/A");
/// ```
pub fn format_rate(part: u64, whole: u64) -> String {
    if whole == 0 {
        return NOT_APPLICABLE.to_string();
    }
    format!("{}%", format_one_decimal(percentage(part, whole)))
}
