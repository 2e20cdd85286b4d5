//! Weighted aggregation
//!
//! Combines component scores into the daily composite (Baraka) score. Weights
//! are normalized by their sum at use time, so scaling every weight by the same
//! positive factor leaves the composite unchanged.

use crate::types::{Component, ComponentScores};
use std::collections::{BTreeMap, HashMap};

/// Anything that can look up a component score by its key
pub trait ScoreLookup {
    fn score_for(&self, key: &str) -> Option<f64>;
}

impl ScoreLookup for ComponentScores {
    fn score_for(&self, key: &str) -> Option<f64> {
        Component::from_key(key).map(|c| self.get(c))
    }
}

impl ScoreLookup for BTreeMap<String, f64> {
    fn score_for(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

impl ScoreLookup for HashMap<String, f64> {
    fn score_for(&self, key: &str) -> Option<f64> {
        self.get(key).copied()
    }
}

/// Weights divided by their sum.
///
/// Non-finite weights count as 0. When the sum is exactly zero the weights are
/// returned unchanged rather than divided.
pub fn normalized_weights(weights: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let cleaned: BTreeMap<String, f64> = weights
        .iter()
        .map(|(key, &w)| (key.clone(), if w.is_finite() { w } else { 0.0 }))
        .collect();

    let sum: f64 = cleaned.values().sum();
    if sum == 0.0 {
        return cleaned;
    }

    cleaned
        .into_iter()
        .map(|(key, w)| (key, w / sum))
        .collect()
}

/// Weighted composite of component scores.
///
/// Sums `score × normalized weight` over the weight keys. A weighted key with
/// no score contributes 0; scores without a weight are ignored.
pub fn weighted_composite<S>(components: &S, weights: &BTreeMap<String, f64>) -> f64
where
    S: ScoreLookup + ?Sized,
{
    normalized_weights(weights)
        .iter()
        .map(|(key, w)| components.score_for(key).unwrap_or(0.0) * w)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
    }

    fn scores() -> ComponentScores {
        ComponentScores {
            prayer_on_time: 80.0,
            quran_recitation: 40.0,
            dhikr: 10.0,
            sadaqah: 0.0,
            sleep: 100.0,
            screen_time: 50.0,
            other_good: 60.0,
            other_bad: 30.0,
        }
    }

    #[test]
    fn test_weighted_mean() {
        let w = weights(&[("prayer_on_time", 3.0), ("sleep", 1.0)]);
        // (80 * 3 + 100 * 1) / 4
        assert!((weighted_composite(&scores(), &w) - 85.0).abs() < EPS);
    }

    #[test]
    fn test_scaling_weights_is_invariant() {
        let base = weights(&[
            ("prayer_on_time", 0.25),
            ("quran_recitation", 0.15),
            ("dhikr", 0.1),
            ("sleep", 0.2),
            ("screen_time", 0.2),
            ("other_bad", 0.1),
        ]);
        let reference = weighted_composite(&scores(), &base);

        for k in [1e-6, 0.5, 3.0, 1234.5, 1e9] {
            let scaled: BTreeMap<String, f64> =
                base.iter().map(|(key, w)| (key.clone(), w * k)).collect();
            let composite = weighted_composite(&scores(), &scaled);
            assert!(
                (composite - reference).abs() < 1e-6,
                "k={k}: {composite} != {reference}"
            );
        }
    }

    #[test]
    fn test_zero_sum_uses_raw_weights() {
        let w = weights(&[("prayer_on_time", 0.0), ("sleep", 0.0)]);
        assert_eq!(weighted_composite(&scores(), &w), 0.0);
        assert_eq!(normalized_weights(&w), w);
    }

    #[test]
    fn test_unknown_and_missing_keys() {
        let w = weights(&[("prayer_on_time", 1.0), ("fasting", 1.0)]);
        // fasting has no score: contributes 0 but still dilutes
        assert!((weighted_composite(&scores(), &w) - 40.0).abs() < EPS);

        let map: BTreeMap<String, f64> = [("prayer_on_time".to_string(), 90.0)].into_iter().collect();
        let w = weights(&[("prayer_on_time", 2.0)]);
        assert!((weighted_composite(&map, &w) - 90.0).abs() < EPS);
    }

    #[test]
    fn test_empty_weights() {
        assert_eq!(weighted_composite(&scores(), &BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_composite_bounded_with_non_negative_weights() {
        let full = ComponentScores {
            prayer_on_time: 100.0,
            quran_recitation: 100.0,
            dhikr: 100.0,
            sadaqah: 100.0,
            sleep: 100.0,
            screen_time: 100.0,
            other_good: 100.0,
            other_bad: 100.0,
        };
        let w = weights(&[("prayer_on_time", 7.0), ("dhikr", 0.3), ("sleep", 11.0)]);
        let composite = weighted_composite(&full, &w);
        assert!((composite - 100.0).abs() < EPS);
        assert!((0.0..=100.0 + EPS).contains(&weighted_composite(&scores(), &w)));
    }

    #[test]
    fn test_hash_map_lookup() {
        let map: HashMap<String, f64> = [("sleep".to_string(), 70.0)].into_iter().collect();
        let w = weights(&[("sleep", 1.0)]);
        assert!((weighted_composite(&map, &w) - 70.0).abs() < EPS);
    }
}
