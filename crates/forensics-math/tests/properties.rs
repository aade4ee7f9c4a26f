use forensics_math::{clamp_score, recency_decay, round_percent, safe_ratio};
use proptest::prelude::*;

proptest! {
    #[test]
    fn clamp_score_is_always_in_range(value in -10000.0f64..10000.0) {
        let score = clamp_score(value);
        prop_assert!(score <= 100);
    }

    #[test]
    fn clamp_score_is_idempotent(value in -10000.0f64..10000.0) {
        let once = clamp_score(value);
        let twice = clamp_score(f64::from(once));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn round_percent_is_always_in_range(numerator in 0.0f64..100000.0, denominator in 0.0f64..100000.0) {
        let pct = round_percent(numerator, denominator);
        prop_assert!(pct <= 100 || denominator < numerator);
    }

    #[test]
    fn round_percent_zero_denominator_is_zero(numerator in 0.0f64..100000.0) {
        prop_assert_eq!(round_percent(numerator, 0.0), 0);
    }

    #[test]
    fn safe_ratio_zero_denominator_is_zero(numer in -10000.0f64..10000.0) {
        prop_assert_eq!(safe_ratio(numer, 0.0), 0.0);
    }

    #[test]
    fn safe_ratio_self_is_one(value in 1.0f64..10000.0) {
        prop_assert!((safe_ratio(value, value) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recency_decay_is_strictly_decreasing_in_days_ago(
        half_life in 1.0f64..365.0,
        a in 0.0f64..1000.0,
        b in 0.0f64..1000.0,
    ) {
        let decay_a = recency_decay(a, half_life);
        let decay_b = recency_decay(b, half_life);
        if a < b {
            prop_assert!(decay_a > decay_b);
        } else if a > b {
            prop_assert!(decay_a < decay_b);
        } else {
            prop_assert!((decay_a - decay_b).abs() < 1e-12);
        }
    }

    #[test]
    fn recency_decay_stays_within_unit_interval(days_ago in 0.0f64..5000.0, half_life in 1.0f64..365.0) {
        let decay = recency_decay(days_ago, half_life);
        prop_assert!((0.0..=1.0).contains(&decay));
    }

    #[test]
    fn recency_decay_at_zero_is_one(half_life in 1.0f64..365.0) {
        prop_assert!((recency_decay(0.0, half_life) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recency_decay_at_half_life_is_one_half(half_life in 1.0f64..365.0) {
        prop_assert!((recency_decay(half_life, half_life) - 0.5).abs() < 1e-9);
    }
}
