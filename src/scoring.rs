//! Component scoring
//!
//! One pure function per activity domain, each mapping a feature value and its
//! policy to a score in [0, 100]. Output is clamped whatever the input or
//! policy, so a broken config degrades scores instead of failing a run.

use crate::config::{
    Config, DhikrPolicy, OtherPolicy, QuranPolicy, SadaqahPolicy, ScreenTimePolicy, SleepPolicy,
};
use crate::normalizer;
use crate::types::{ComponentScores, FeatureRecord, ScreenTimeSplit};

/// Upper bound of every component score
pub const MAX_SCORE: f64 = 100.0;

/// Screen-time score when no app usage was logged
pub const NEUTRAL_SCREEN_SCORE: f64 = 50.0;

/// Sadaqah amount that maps to a full score
pub const SADAQAH_FULL_AMOUNT: f64 = 1000.0;

/// Hours over which sleep ramps between 0 and 100 outside the ideal window
pub const SLEEP_RAMP_HOURS: f64 = 3.0;

/// Bonus for an early bedtime
pub const BEDTIME_BONUS: f64 = 10.0;

/// Weight of the productive ratio in the screen-time blend; the remainder goes
/// to the distraction penalty.
pub const PRODUCTIVE_RATIO_WEIGHT: f64 = 0.6;

/// Scorer producing all component scores for a feature record
pub struct ComponentScorer;

impl ComponentScorer {
    /// Score every component of one feature record
    pub fn score(feature: &FeatureRecord, config: &Config) -> ComponentScores {
        ComponentScores {
            prayer_on_time: prayer(feature.prayer_on_time),
            quran_recitation: recitation(feature.quran_ayahs, &config.quran),
            dhikr: remembrance(feature.dhikr_reps, &config.dhikr),
            sadaqah: charity(feature.sadaqah_amount, &config.sadaqah),
            sleep: sleep(feature.sleep_hours, feature.bedtime(), &config.sleep),
            screen_time: screen_time(&feature.screen_time(), &config.screen_time),
            other_good: other_good(feature.other_good, &config.other),
            other_bad: other_bad(feature.other_bad, &config.other),
        }
    }
}

/// Clamp into [0, 100]; NaN scores 0
pub fn bounded(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MAX_SCORE)
    }
}

/// Points as a share of the daily maximum. A non-positive maximum saturates
/// any positive points.
fn share_of_max(points: f64, max_points: f64) -> f64 {
    if max_points <= 0.0 {
        return if points > 0.0 { MAX_SCORE } else { 0.0 };
    }
    bounded(points / max_points * MAX_SCORE)
}

/// Prayer score: on-time ratio × 100
pub fn prayer(ratio: f64) -> f64 {
    bounded(ratio * MAX_SCORE)
}

/// Recitation score from the total ayah count
pub fn recitation(ayahs: u64, policy: &QuranPolicy) -> f64 {
    share_of_max(ayahs as f64 * policy.points_per_ayah, policy.max_daily_points)
}

/// Dhikr score from the repetition count
pub fn remembrance(repetitions: u64, policy: &DhikrPolicy) -> f64 {
    share_of_max(
        repetitions as f64 * policy.points_per_repetition,
        policy.max_daily_points,
    )
}

/// Sadaqah score.
///
/// With log scaling the score is `log(amount + 1) / log(1001)`, so small gifts
/// move the score steeply and large ones flatten out; otherwise it is linear up
/// to 1000. An unusable log base falls back to the natural log, which yields
/// the same ratio.
pub fn charity(amount: f64, policy: &SadaqahPolicy) -> f64 {
    let amount = normalizer::non_negative(amount);
    if amount <= 0.0 {
        return 0.0;
    }

    let (value, denominator) = if policy.log_scale {
        let base = policy.log_base;
        if base.is_finite() && base > 0.0 && base != 1.0 {
            ((amount + 1.0).log(base), (SADAQAH_FULL_AMOUNT + 1.0).log(base))
        } else {
            ((amount + 1.0).ln(), (SADAQAH_FULL_AMOUNT + 1.0).ln())
        }
    } else {
        (amount, SADAQAH_FULL_AMOUNT)
    };

    bounded(value / denominator * MAX_SCORE)
}

/// Linear 0-100 position of `value` between `low` and `high`
fn ramp(value: f64, low: f64, high: f64) -> f64 {
    if high <= low {
        return 0.0;
    }
    ((value - low) / (high - low)).clamp(0.0, 1.0) * MAX_SCORE
}

/// Sleep score.
///
/// Flat 100 inside `[ideal_min, ideal_max]`, ramping linearly to 0 at three
/// hours outside either edge. A bedtime at or before the configured threshold
/// (same-day 24h comparison) adds 10, capped at 100. Malformed clock strings
/// forfeit the bonus.
pub fn sleep(hours: f64, bedtime: Option<&str>, policy: &SleepPolicy) -> f64 {
    let hours = normalizer::non_negative(hours);
    let core = if hours < policy.ideal_min_hours {
        ramp(
            hours,
            policy.ideal_min_hours - SLEEP_RAMP_HOURS,
            policy.ideal_min_hours,
        )
    } else if hours > policy.ideal_max_hours {
        MAX_SCORE
            - ramp(
                hours,
                policy.ideal_max_hours,
                policy.ideal_max_hours + SLEEP_RAMP_HOURS,
            )
    } else {
        MAX_SCORE
    };

    let bonus = match bedtime {
        Some(bedtime) if early_bedtime(bedtime, &policy.bedtime_bonus_before) => BEDTIME_BONUS,
        _ => 0.0,
    };

    bounded(core + bonus)
}

fn early_bedtime(bedtime: &str, threshold: &str) -> bool {
    match (
        normalizer::parse_clock(bedtime),
        normalizer::parse_clock(threshold),
    ) {
        (Some(bed), Some(limit)) => bed <= limit,
        _ => {
            tracing::debug!(bedtime, threshold, "unparsable bedtime; no bonus");
            false
        }
    }
}

/// Screen-time score.
///
/// With no app usage logged the score is a neutral 50. Otherwise it blends the
/// productive share of categorized minutes (60%) with a penalty that falls
/// linearly as distracting minutes approach the daily cap (40%).
pub fn screen_time(split: &ScreenTimeSplit, policy: &ScreenTimePolicy) -> f64 {
    if !split.has_signal() {
        return NEUTRAL_SCREEN_SCORE;
    }

    let productive = normalizer::non_negative(split.productive_minutes);
    let distracting = normalizer::non_negative(split.distracting_minutes);

    let ratio = productive / (productive + distracting).max(1.0);
    let cap = policy.max_daily_minutes.max(1.0);
    let distraction_penalty = 1.0 - (distracting / cap).min(1.0);

    let combined = PRODUCTIVE_RATIO_WEIGHT * ratio
        + (1.0 - PRODUCTIVE_RATIO_WEIGHT) * distraction_penalty;
    bounded(combined * MAX_SCORE)
}

/// Habit score from a signed point total: −100 → 0, 0 → 50, +100 → 100
pub fn habit_balance(raw_points: f64) -> f64 {
    bounded((raw_points + 100.0) / 200.0 * MAX_SCORE)
}

/// Habit score from a good and a bad count netted into one point total.
///
/// The two habit components never share a total: [`other_good`] sees only
/// the good count and [`other_bad`] only the bad count, so each moves
/// independently of the other's count.
pub fn other_habits(good: u32, bad: u32, policy: &OtherPolicy) -> f64 {
    habit_balance(f64::from(good) * policy.good_points - f64::from(bad) * policy.bad_points)
}

/// Good-habit component: the habit score with no bad habits counted
pub fn other_good(good: u32, policy: &OtherPolicy) -> f64 {
    other_habits(good, 0, policy)
}

/// Bad-habit component: the habit score with no good habits counted
pub fn other_bad(bad: u32, policy: &OtherPolicy) -> f64 {
    other_habits(0, bad, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn all_scores(feature: &FeatureRecord, config: &Config) -> [f64; 8] {
        let s = ComponentScorer::score(feature, config);
        [
            s.prayer_on_time,
            s.quran_recitation,
            s.dhikr,
            s.sadaqah,
            s.sleep,
            s.screen_time,
            s.other_good,
            s.other_bad,
        ]
    }

    #[test]
    fn test_prayer() {
        assert_eq!(prayer(1.0), 100.0);
        assert!((prayer(0.6) - 60.0).abs() < EPS);
        assert_eq!(prayer(3.0), 100.0);
    }

    #[test]
    fn test_recitation_and_dhikr_saturate() {
        let quran = QuranPolicy {
            points_per_ayah: 2.0,
            max_daily_points: 100.0,
        };
        assert!((recitation(10, &quran) - 20.0).abs() < EPS);
        assert_eq!(recitation(10_000, &quran), 100.0);
        assert_eq!(recitation(0, &quran), 0.0);

        let dhikr = DhikrPolicy {
            points_per_repetition: 0.1,
            max_daily_points: 100.0,
        };
        assert!((remembrance(330, &dhikr) - 33.0).abs() < EPS);
        assert_eq!(remembrance(u64::MAX, &dhikr), 100.0);
    }

    #[test]
    fn test_zero_maximum_saturates() {
        let quran = QuranPolicy {
            points_per_ayah: 1.0,
            max_daily_points: 0.0,
        };
        assert_eq!(recitation(1, &quran), 100.0);
        assert_eq!(recitation(0, &quran), 0.0);
    }

    #[test]
    fn test_charity_log_scale() {
        let policy = SadaqahPolicy::default();
        assert_eq!(charity(0.0, &policy), 0.0);
        assert_eq!(charity(-3.0, &policy), 0.0);
        assert!((charity(1000.0, &policy) - 100.0).abs() < EPS);
        assert_eq!(charity(1.0e9, &policy), 100.0);

        // log10(11) / log10(1001) * 100
        let expected = 11f64.log10() / 1001f64.log10() * 100.0;
        assert!((charity(10.0, &policy) - expected).abs() < EPS);
    }

    #[test]
    fn test_charity_linear_and_bad_base() {
        let linear = SadaqahPolicy {
            log_scale: false,
            log_base: 10.0,
        };
        assert!((charity(250.0, &linear) - 25.0).abs() < EPS);

        let bad_base = SadaqahPolicy {
            log_scale: true,
            log_base: 1.0,
        };
        let natural = 11f64.ln() / 1001f64.ln() * 100.0;
        assert!((charity(10.0, &bad_base) - natural).abs() < EPS);
    }

    #[test]
    fn test_charity_monotonic() {
        for policy in [
            SadaqahPolicy::default(),
            SadaqahPolicy {
                log_scale: false,
                log_base: 10.0,
            },
            SadaqahPolicy {
                log_scale: true,
                log_base: 2.0,
            },
        ] {
            let mut previous = 0.0;
            for step in 0..400 {
                let amount = f64::from(step) * 7.5;
                let score = charity(amount, &policy);
                assert!(score >= previous, "{amount} scored {score} < {previous}");
                previous = score;
            }
        }
    }

    #[test]
    fn test_sleep_window_is_flat() {
        let policy = SleepPolicy::default();
        for hours in [7.0, 7.25, 7.8, 8.5] {
            assert_eq!(sleep(hours, None, &policy), 100.0);
        }
    }

    #[test]
    fn test_sleep_ramps() {
        let policy = SleepPolicy {
            ideal_min_hours: 6.0,
            ideal_max_hours: 8.0,
            bedtime_bonus_before: "23:00".to_string(),
        };
        assert_eq!(sleep(0.0, None, &policy), 0.0);
        assert_eq!(sleep(3.0, None, &policy), 0.0);
        assert!((sleep(4.5, None, &policy) - 50.0).abs() < EPS);
        assert!((sleep(9.5, None, &policy) - 50.0).abs() < EPS);
        assert_eq!(sleep(11.0, None, &policy), 0.0);
        assert_eq!(sleep(20.0, None, &policy), 0.0);
    }

    #[test]
    fn test_sleep_bedtime_bonus() {
        let policy = SleepPolicy {
            ideal_min_hours: 6.0,
            ideal_max_hours: 8.0,
            bedtime_bonus_before: "23:00".to_string(),
        };
        assert!((sleep(4.5, Some("22:30"), &policy) - 60.0).abs() < EPS);
        assert!((sleep(4.5, Some("23:00"), &policy) - 60.0).abs() < EPS);
        assert!((sleep(4.5, Some("23:30"), &policy) - 50.0).abs() < EPS);
        assert!((sleep(4.5, Some("bedtime"), &policy) - 50.0).abs() < EPS);
        assert_eq!(sleep(7.0, Some("21:00"), &policy), 100.0);

        let broken = SleepPolicy {
            bedtime_bonus_before: "soon".to_string(),
            ..policy
        };
        assert!((sleep(4.5, Some("21:00"), &broken) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_screen_time_neutral_without_data() {
        let policy = ScreenTimePolicy::default();
        let empty = ScreenTimeSplit::default();
        assert_eq!(screen_time(&empty, &policy), NEUTRAL_SCREEN_SCORE);

        let stale = ScreenTimeSplit {
            productive_minutes: 90.0,
            distracting_minutes: 500.0,
            tracked_apps: 0,
        };
        assert_eq!(screen_time(&stale, &policy), NEUTRAL_SCREEN_SCORE);
    }

    #[test]
    fn test_screen_time_blend() {
        let policy = ScreenTimePolicy {
            max_daily_minutes: 120.0,
            ..ScreenTimePolicy::default()
        };

        let split = ScreenTimeSplit {
            productive_minutes: 60.0,
            distracting_minutes: 60.0,
            tracked_apps: 2,
        };
        // 0.6 * 0.5 + 0.4 * (1 - 0.5) = 0.5
        assert!((screen_time(&split, &policy) - 50.0).abs() < EPS);

        let only_productive = ScreenTimeSplit {
            productive_minutes: 30.0,
            distracting_minutes: 0.0,
            tracked_apps: 1,
        };
        assert!((screen_time(&only_productive, &policy) - 100.0).abs() < EPS);

        let unmatched = ScreenTimeSplit {
            productive_minutes: 0.0,
            distracting_minutes: 0.0,
            tracked_apps: 1,
        };
        assert!((screen_time(&unmatched, &policy) - 40.0).abs() < EPS);

        let binge = ScreenTimeSplit {
            productive_minutes: 0.0,
            distracting_minutes: 600.0,
            tracked_apps: 1,
        };
        assert_eq!(screen_time(&binge, &policy), 0.0);
    }

    #[test]
    fn test_other_habits() {
        let policy = OtherPolicy::default();
        assert_eq!(other_good(0, &policy), 50.0);
        assert_eq!(other_bad(0, &policy), 50.0);
        assert!((other_good(3, &policy) - 65.0).abs() < EPS);
        assert!((other_bad(2, &policy) - 40.0).abs() < EPS);
        assert_eq!(other_good(50, &policy), 100.0);
        assert_eq!(other_bad(50, &policy), 0.0);
        assert!((other_habits(3, 2, &policy) - 55.0).abs() < EPS);
    }

    #[test]
    fn test_habit_components_ignore_each_others_count() {
        let config = Config::default();
        let heavy_bad = FeatureRecord {
            other_good: 3,
            other_bad: 20,
            ..Default::default()
        };
        let scores = ComponentScorer::score(&heavy_bad, &config);
        assert!((scores.other_good - 65.0).abs() < EPS);
        assert_eq!(scores.other_bad, 0.0);

        let no_bad = FeatureRecord {
            other_bad: 0,
            ..heavy_bad.clone()
        };
        assert_eq!(ComponentScorer::score(&no_bad, &config).other_good, scores.other_good);
    }

    #[test]
    fn test_scores_bounded_for_extreme_inputs() {
        let feature = FeatureRecord {
            date: "2024-01-01".to_string(),
            prayer_on_time: 1.0,
            quran_ayahs: u64::MAX,
            dhikr_reps: u64::MAX,
            sadaqah_amount: f64::MAX,
            sleep_hours: 1.0e12,
            bedtime: "00:00".to_string(),
            prod_minutes: 1.0e15,
            dist_minutes: 1.0e15,
            tracked_apps: u32::MAX,
            other_good: u32::MAX,
            other_bad: u32::MAX,
            ..Default::default()
        };

        let mut extreme = Config::default();
        extreme.quran.points_per_ayah = 1.0e300;
        extreme.dhikr.max_daily_points = -5.0;
        extreme.screen_time.max_daily_minutes = 0.0;
        extreme.other.good_points = f64::MAX;
        extreme.sleep.ideal_min_hours = 20.0;
        extreme.sleep.ideal_max_hours = 2.0;

        for config in [Config::default(), extreme] {
            for score in all_scores(&feature, &config) {
                assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            }
            for score in all_scores(&FeatureRecord::default(), &config) {
                assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            }
        }
    }
}
