//! Pipeline orchestration
//!
//! This module provides the public API for Barakah Score. It runs the full
//! batch computation from raw daily entries to the feature, score and outcome
//! tables. Every run recomputes everything from scratch against the config
//! snapshot it is handed.

use crate::aggregator::weighted_composite;
use crate::config::Config;
use crate::error::ComputeError;
use crate::features::FeatureBuilder;
use crate::schema::{parse_log_array, RawLogEntry};
use crate::scoring::ComponentScorer;
use crate::types::{FeatureRecord, OutcomeRecord, ScoreRecord};
use serde::{Deserialize, Serialize};

/// Output tables of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTables {
    /// One row per date, ascending
    pub features: Vec<FeatureRecord>,
    /// One row per feature row, same order
    pub scores: Vec<ScoreRecord>,
}

impl ScoreTables {
    /// Date + ratings projection of the score table
    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.scores.iter().map(OutcomeRecord::from).collect()
    }

    /// Most recent scored day
    pub fn latest(&self) -> Option<&ScoreRecord> {
        self.scores.last()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Score every feature record.
///
/// Pipeline stages per record:
/// 1. ComponentScorer - Bounded score per activity domain
/// 2. weighted_composite - Weighted Baraka score
pub fn compute_scores(features: &[FeatureRecord], config: &Config) -> Vec<ScoreRecord> {
    features
        .iter()
        .map(|feature| {
            let components = ComponentScorer::score(feature, config);
            let baraka_score = weighted_composite(&components, &config.weights);
            ScoreRecord::new(
                feature.date.clone(),
                &components,
                baraka_score,
                feature.outcomes(),
            )
        })
        .collect()
}

/// Run the full pipeline over raw entries in submission order.
///
/// An empty log yields empty tables; the aggregator is never invoked.
pub fn run(entries: &[RawLogEntry], config: &Config) -> ScoreTables {
    let features = FeatureBuilder::build(entries, config);
    if features.is_empty() {
        tracing::debug!("no feature rows; skipping scoring");
        return ScoreTables::default();
    }

    let scores = compute_scores(&features, config);
    tracing::debug!(days = scores.len(), "scored daily features");

    ScoreTables { features, scores }
}

/// Convert a raw daily-log JSON array and a config JSON document to the score
/// table, as a JSON array of score rows.
///
/// # Example
/// ```ignore
/// let scores_json = log_to_scores_json(
///     r#"[{"date": "2024-01-15", "Fajr": true}]"#,
///     "{}",
/// )?;
/// ```
pub fn log_to_scores_json(log_json: &str, config_json: &str) -> Result<String, ComputeError> {
    let entries = parse_log_array(log_json)?;
    let config = Config::from_json(config_json)?;
    let tables = run(&entries, &config);
    serde_json::to_string_pretty(&tables.scores).map_err(ComputeError::JsonError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Component;

    #[test]
    fn test_empty_log() {
        let tables = run(&[], &Config::default());
        assert!(tables.is_empty());
        assert!(tables.scores.is_empty());
        assert!(tables.outcomes().is_empty());
        assert!(tables.latest().is_none());
    }

    #[test]
    fn test_scores_follow_features() {
        let mut early = RawLogEntry::for_date("2024-01-02");
        early.fajr = true;
        early.focus = Some(4);
        let late = RawLogEntry::for_date("2024-01-01");

        let tables = run(&[early, late], &Config::default());
        assert_eq!(tables.features.len(), 2);
        assert_eq!(tables.scores.len(), 2);
        assert_eq!(tables.scores[0].date, "2024-01-01");
        assert_eq!(tables.scores[1].date, "2024-01-02");
        assert!((tables.scores[1].prayer_on_time - 20.0).abs() < 1e-9);
        assert_eq!(tables.outcomes()[1].focus, Some(4));
        assert_eq!(tables.latest().map(|s| s.date.as_str()), Some("2024-01-02"));
    }

    #[test]
    fn test_composite_uses_fresh_weights() {
        let mut entry = RawLogEntry::for_date("2024-01-03");
        entry.fajr = true;
        entry.dhuhr = true;
        entry.asr = true;
        entry.maghrib = true;
        entry.isha = true;

        let prayer_only = Config {
            weights: [(Component::PrayerOnTime.as_str().to_string(), 1.0)]
                .into_iter()
                .collect(),
            ..Config::default()
        };
        let scores = run(&[entry.clone()], &prayer_only).scores;
        assert!((scores[0].baraka_score - 100.0).abs() < 1e-9);

        let sadaqah_only = prayer_only
            .with_weight(Component::PrayerOnTime, 0.0)
            .with_weight(Component::Sadaqah, 1.0);
        let scores = run(&[entry], &sadaqah_only).scores;
        assert_eq!(scores[0].baraka_score, 0.0);
    }

    #[test]
    fn test_log_to_scores_json() {
        let json = log_to_scores_json(
            r#"[{"date": "2024-01-15", "Fajr": true, "Isha": true, "calm": 3}]"#,
            r#"{"weights": {"prayer_on_time": 1}}"#,
        )
        .unwrap();

        let rows: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(rows[0]["date"], "2024-01-15");
        assert_eq!(rows[0]["calm"], 3);
        assert!((rows[0]["baraka_score"].as_f64().unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_to_scores_json_rejects_bad_input() {
        assert!(log_to_scores_json("nope", "{}").is_err());
        assert!(log_to_scores_json("[]", r#"{"weights": 3}"#).is_err());
        assert_eq!(log_to_scores_json("[]", "{}").unwrap().trim(), "[]");
    }
}
