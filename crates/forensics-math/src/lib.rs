//! Deterministic numeric helpers shared by the forensics engines.
//!
//! Every score in the forensic report is clamped to `[0, 100]` and rounded
//! with these helpers so that two runs over an unchanged repository produce
//! byte-identical Markdown.

#![forbid(unsafe_code)]

/// Round a floating point value to `decimals` decimal places.
#[must_use]
pub fn round_f64(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Round to the nearest integer percentage, guarding divide-by-zero.
#[must_use]
pub fn round_percent(numerator: f64, denominator: f64) -> u32 {
    if denominator <= 0.0 {
        return 0;
    }
    round_f64((numerator / denominator) * 100.0, 0).max(0.0) as u32
}

/// Clamp a score into the `[0, 100]` range required by every result type.
#[must_use]
pub fn clamp_score(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}

/// Return a ratio guarded against division by zero.
#[must_use]
pub fn safe_ratio(numer: f64, denom: f64) -> f64 {
    if denom == 0.0 { 0.0 } else { numer / denom }
}

/// Exponential recency decay: halves every `half_life_days`.
///
/// `recency_decay(0) == 1.0`, `recency_decay(half_life_days) == 0.5`.
#[must_use]
pub fn recency_decay(days_ago: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return if days_ago <= 0.0 { 1.0 } else { 0.0 };
    }
    0.5f64.powf(days_ago / half_life_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_f64_rounds_half_up() {
        assert_eq!(round_f64(1.005, 2), 1.0);
        assert_eq!(round_f64(2.345, 1), 2.3);
    }

    #[test]
    fn round_percent_guards_zero_denominator() {
        assert_eq!(round_percent(5.0, 0.0), 0);
    }

    #[test]
    fn round_percent_rounds_to_nearest_whole() {
        assert_eq!(round_percent(1.0, 3.0), 33);
        assert_eq!(round_percent(2.0, 3.0), 67);
    }

    #[test]
    fn clamp_score_bounds_both_ends() {
        assert_eq!(clamp_score(-5.0), 0);
        assert_eq!(clamp_score(142.0), 100);
        assert_eq!(clamp_score(50.4), 50);
    }

    #[test]
    fn recency_decay_matches_documented_fixed_points() {
        assert!((recency_decay(0.0, 30.0) - 1.0).abs() < 1e-9);
        assert!((recency_decay(30.0, 30.0) - 0.5).abs() < 1e-9);
        assert!((recency_decay(60.0, 30.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn recency_decay_is_strictly_decreasing() {
        let a = recency_decay(10.0, 30.0);
        let b = recency_decay(20.0, 30.0);
        let c = recency_decay(30.0, 30.0);
        assert!(a > b);
        assert!(b > c);
    }
}
