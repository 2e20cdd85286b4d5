//! Feature building
//!
//! This module reduces raw daily submissions to one canonical feature record per
//! calendar date:
//! - Prayer flags to an on-time ratio
//! - Recitations to a total ayah count (whole surahs resolved)
//! - App minutes to productive/distracting buckets
//! - Duplicate submissions for a date resolved to the last one

use crate::config::{Config, ScreenTimePolicy};
use crate::normalizer::{self, DateKey};
use crate::schema::{RawLogEntry, Recitation};
use crate::types::{FeatureRecord, ScreenTimeSplit};
use std::collections::{BTreeMap, HashSet};

/// Feature builder for turning raw entries into feature records
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build the feature table from the full entry collection, in submission
    /// order.
    ///
    /// Output has exactly one record per date key, sorted ascending. When
    /// several entries share a date the last one wins outright; fields are not
    /// merged across submissions. Entries without a date are skipped.
    pub fn build(entries: &[RawLogEntry], config: &Config) -> Vec<FeatureRecord> {
        let mut by_date: BTreeMap<String, FeatureRecord> = BTreeMap::new();
        let mut skipped = 0usize;

        for entry in entries {
            match Self::extract(entry, &config.screen_time) {
                Some(record) => {
                    by_date.insert(record.date.clone(), record);
                }
                None => skipped += 1,
            }
        }

        let kept = by_date.len();
        tracing::debug!(
            entries = entries.len(),
            dates = kept,
            replaced = entries.len() - skipped - kept,
            skipped,
            "built feature table"
        );

        by_date.into_values().collect()
    }

    /// Extract the feature record of a single entry; `None` when it has no date
    pub fn extract(entry: &RawLogEntry, screen_policy: &ScreenTimePolicy) -> Option<FeatureRecord> {
        let date = match normalizer::normalize_date(&entry.date) {
            DateKey::Missing => {
                tracing::warn!("skipping log entry without a date");
                return None;
            }
            key @ DateKey::Literal(_) => {
                tracing::warn!(date = %entry.date, "date is not a calendar date; keeping it verbatim");
                key.as_key()?
            }
            key @ DateKey::Calendar(_) => key.as_key()?,
        };

        let screen = categorize_apps(&entry.app_minutes, screen_policy);

        Some(FeatureRecord {
            date,
            prayer_on_time: normalizer::prayer_ratio(entry.prayer_flags()),
            quran_ayahs: total_ayahs(&entry.quran_recs),
            dhikr_reps: entry.dhikr_reps,
            sadaqah_amount: normalizer::non_negative(entry.sadaqah_amount),
            sleep_hours: normalizer::non_negative(entry.sleep_hours),
            bedtime: entry.bedtime.clone().unwrap_or_default(),
            prod_minutes: screen.productive_minutes,
            dist_minutes: screen.distracting_minutes,
            tracked_apps: screen.tracked_apps,
            other_good: entry.other_good,
            other_bad: entry.other_bad,
            clarity: entry.clarity,
            focus: entry.focus,
            calm: entry.calm,
            productivity: entry.productivity,
        })
    }
}

/// Total ayahs across recitation items. An item with 0 ayahs counts the whole
/// surah from the reference table; unknown surahs count 0.
pub fn total_ayahs(recitations: &[Recitation]) -> u64 {
    recitations
        .iter()
        .map(|rec| u64::from(rec.resolved_ayahs()))
        .sum()
}

/// Split app minutes into productive and distracting buckets.
///
/// App names match list entries ignoring surrounding whitespace and ASCII case.
/// An app on both lists adds to both buckets; an app on neither adds to
/// neither but still counts as tracked.
pub fn categorize_apps(
    app_minutes: &BTreeMap<String, f64>,
    policy: &ScreenTimePolicy,
) -> ScreenTimeSplit {
    let productive = fold_app_names(&policy.productive_apps);
    let distracting = fold_app_names(&policy.distracting_apps);

    let mut split = ScreenTimeSplit::default();
    for (app, minutes) in app_minutes {
        let key = fold_app_name(app);
        let minutes = normalizer::non_negative(*minutes);
        if productive.contains(&key) {
            split.productive_minutes += minutes;
        }
        if distracting.contains(&key) {
            split.distracting_minutes += minutes;
        }
        split.tracked_apps = split.tracked_apps.saturating_add(1);
    }
    split
}

fn fold_app_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn fold_app_names(names: &[String]) -> HashSet<String> {
    names.iter().map(|n| fold_app_name(n)).collect()
}
