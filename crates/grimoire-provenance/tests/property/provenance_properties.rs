use grimoire_provenance::{harmonic_mean, ConfidenceLevel};
use proptest::prelude::*;

proptest! {
    #[test]
    fn harmonic_mean_never_exceeds_arithmetic(values in proptest::collection::vec(0.0..=1.0f64, 1..8)) {
        let hm = harmonic_mean(&values);
        let am = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert!((0.0..=1.0).contains(&hm));
        prop_assert!(hm <= am + 1e-9);
    }

    #[test]
    fn harmonic_mean_bounded_by_extremes(values in proptest::collection::vec(0.01..=1.0f64, 1..8)) {
        let hm = harmonic_mean(&values);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        prop_assert!(hm >= min - 1e-9);
        prop_assert!(hm <= max + 1e-9);
    }

    #[test]
    fn confidence_buckets_are_monotonic(a in 0.0..=1.0f64, b in 0.0..=1.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ConfidenceLevel::from_score(lo) <= ConfidenceLevel::from_score(hi));
    }
}
