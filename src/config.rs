//! Scoring configuration
//!
//! The configuration document carries the composite weighting vector and the
//! numeric policy for every component scorer. Every section and field has a
//! default, so partial documents load. The pipeline takes a fresh snapshot on
//! every call and never caches policy values.

use crate::error::ComputeError;
use crate::normalizer;
use crate::types::Component;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Qur'an recitation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuranPolicy {
    pub points_per_ayah: f64,
    pub max_daily_points: f64,
}

impl Default for QuranPolicy {
    fn default() -> Self {
        Self {
            points_per_ayah: 1.0,
            max_daily_points: 100.0,
        }
    }
}

/// Dhikr (remembrance) policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhikrPolicy {
    pub points_per_repetition: f64,
    pub max_daily_points: f64,
}

impl Default for DhikrPolicy {
    fn default() -> Self {
        Self {
            points_per_repetition: 0.1,
            max_daily_points: 100.0,
        }
    }
}

/// Sadaqah (charitable giving) policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SadaqahPolicy {
    /// Score on a log scale so that small gifts count and large ones saturate
    pub log_scale: bool,
    pub log_base: f64,
}

impl Default for SadaqahPolicy {
    fn default() -> Self {
        Self {
            log_scale: true,
            log_base: 10.0,
        }
    }
}

/// Sleep policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepPolicy {
    pub ideal_min_hours: f64,
    pub ideal_max_hours: f64,
    /// Bedtimes at or before this `HH:MM` earn a bonus
    pub bedtime_bonus_before: String,
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            ideal_min_hours: 7.0,
            ideal_max_hours: 8.5,
            bedtime_bonus_before: "23:00".to_string(),
        }
    }
}

/// Screen-time policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenTimePolicy {
    pub productive_apps: Vec<String>,
    pub distracting_apps: Vec<String>,
    /// Distracting minutes at which the distraction penalty saturates
    pub max_daily_minutes: f64,
}

impl Default for ScreenTimePolicy {
    fn default() -> Self {
        Self {
            productive_apps: ["Quran", "Kindle", "Notion", "Anki", "Duolingo"]
                .map(String::from)
                .to_vec(),
            distracting_apps: ["TikTok", "Instagram", "YouTube", "Twitter", "Reddit"]
                .map(String::from)
                .to_vec(),
            max_daily_minutes: 120.0,
        }
    }
}

/// Other good/bad habit policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherPolicy {
    pub good_points: f64,
    pub bad_points: f64,
}

impl Default for OtherPolicy {
    fn default() -> Self {
        Self {
            good_points: 10.0,
            bad_points: 10.0,
        }
    }
}

/// Outcome model policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPolicy {
    /// Outcome-bearing rows required before a model is fitted
    pub min_samples: usize,
    /// Upper bound on cross-validation folds
    pub max_folds: usize,
    /// L2 penalty of the ridge regression
    pub ridge_penalty: f64,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self {
            min_samples: 10,
            max_folds: 5,
            ridge_penalty: 1.0,
        }
    }
}

/// Complete scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Component key → non-negative weight; normalized by the sum at use time
    pub weights: BTreeMap<String, f64>,
    pub quran: QuranPolicy,
    pub dhikr: DhikrPolicy,
    pub sadaqah: SadaqahPolicy,
    pub sleep: SleepPolicy,
    pub screen_time: ScreenTimePolicy,
    pub other: OtherPolicy,
    pub model: ModelPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            quran: QuranPolicy::default(),
            dhikr: DhikrPolicy::default(),
            sadaqah: SadaqahPolicy::default(),
            sleep: SleepPolicy::default(),
            screen_time: ScreenTimePolicy::default(),
            other: OtherPolicy::default(),
            model: ModelPolicy::default(),
        }
    }
}

fn default_weights() -> BTreeMap<String, f64> {
    [
        (Component::PrayerOnTime, 0.25),
        (Component::QuranRecitation, 0.15),
        (Component::Dhikr, 0.10),
        (Component::Sadaqah, 0.10),
        (Component::Sleep, 0.15),
        (Component::ScreenTime, 0.15),
        (Component::OtherGood, 0.05),
        (Component::OtherBad, 0.05),
    ]
    .into_iter()
    .map(|(c, w)| (c.as_str().to_string(), w))
    .collect()
}

impl Config {
    /// Load configuration from JSON. Absent sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        serde_json::from_str(json).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }

    /// Replace the weight of one component
    pub fn with_weight(mut self, component: Component, weight: f64) -> Self {
        self.weights.insert(component.as_str().to_string(), weight);
        self
    }

    /// Policy problems that make scores misleading. Scoring still runs; every
    /// scorer clamps its output regardless.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (key, weight) in &self.weights {
            if Component::from_key(key).is_none() {
                issues.push(ConfigIssue::UnknownWeight(key.clone()));
            }
            if !weight.is_finite() || *weight < 0.0 {
                issues.push(ConfigIssue::InvalidWeight {
                    key: key.clone(),
                    weight: *weight,
                });
            }
        }
        if self.weights.values().sum::<f64>() == 0.0 {
            issues.push(ConfigIssue::ZeroWeightSum);
        }

        if self.quran.max_daily_points <= 0.0 {
            issues.push(ConfigIssue::NonPositiveMaximum("quran.max_daily_points"));
        }
        if self.dhikr.max_daily_points <= 0.0 {
            issues.push(ConfigIssue::NonPositiveMaximum("dhikr.max_daily_points"));
        }
        if self.screen_time.max_daily_minutes <= 0.0 {
            issues.push(ConfigIssue::NonPositiveMaximum("screen_time.max_daily_minutes"));
        }
        if self.sadaqah.log_scale
            && (self.sadaqah.log_base <= 0.0 || self.sadaqah.log_base == 1.0)
        {
            issues.push(ConfigIssue::InvalidLogBase(self.sadaqah.log_base));
        }

        if self.sleep.ideal_min_hours > self.sleep.ideal_max_hours {
            issues.push(ConfigIssue::InvertedSleepWindow {
                min: self.sleep.ideal_min_hours,
                max: self.sleep.ideal_max_hours,
            });
        }
        if normalizer::parse_clock(&self.sleep.bedtime_bonus_before).is_none() {
            issues.push(ConfigIssue::MalformedBedtimeThreshold(
                self.sleep.bedtime_bonus_before.clone(),
            ));
        }

        if self.model.max_folds < 2 {
            issues.push(ConfigIssue::TooFewFolds(self.model.max_folds));
        }

        issues
    }
}

/// Configuration problems reported by [`Config::issues`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigIssue {
    #[error("Weight '{0}' does not name a component and is ignored")]
    UnknownWeight(String),

    #[error("Weight '{key}' = {weight} is negative or not finite")]
    InvalidWeight { key: String, weight: f64 },

    #[error("Weights sum to zero; composite uses raw weights")]
    ZeroWeightSum,

    #[error("{0} must be positive")]
    NonPositiveMaximum(&'static str),

    #[error("sadaqah.log_base {0} is not a valid logarithm base; natural log is used")]
    InvalidLogBase(f64),

    #[error("Ideal sleep window is inverted ({min} > {max})")]
    InvertedSleepWindow { min: f64, max: f64 },

    #[error("Bedtime threshold '{0}' is not HH:MM; no bedtime bonus will apply")]
    MalformedBedtimeThreshold(String),

    #[error("model.max_folds = {0}; cross-validation needs at least 2 folds")]
    TooFewFolds(usize),
}
