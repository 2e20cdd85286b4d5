//! Core types for the Barakah pipeline
//!
//! This module defines the data structures that flow between stages: the
//! per-date feature record, the component scores, and the persisted score and
//! outcome rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scored activity domains, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    PrayerOnTime,
    QuranRecitation,
    Dhikr,
    Sadaqah,
    Sleep,
    ScreenTime,
    OtherGood,
    OtherBad,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::PrayerOnTime,
        Component::QuranRecitation,
        Component::Dhikr,
        Component::Sadaqah,
        Component::Sleep,
        Component::ScreenTime,
        Component::OtherGood,
        Component::OtherBad,
    ];

    /// Key used in weight maps and table headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::PrayerOnTime => "prayer_on_time",
            Component::QuranRecitation => "quran_recitation",
            Component::Dhikr => "dhikr",
            Component::Sadaqah => "sadaqah",
            Component::Sleep => "sleep",
            Component::ScreenTime => "screen_time",
            Component::OtherGood => "other_good",
            Component::OtherBad => "other_bad",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == key)
    }
}

/// The four self-rated outcomes, each 1-5 when present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcomes {
    pub clarity: Option<u8>,
    pub focus: Option<u8>,
    pub calm: Option<u8>,
    pub productivity: Option<u8>,
}

impl Outcomes {
    /// Rating names in column order
    pub const NAMES: [&'static str; 4] = ["clarity", "focus", "calm", "productivity"];

    pub fn as_array(&self) -> [Option<u8>; 4] {
        [self.clarity, self.focus, self.calm, self.productivity]
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(Option::is_some)
    }

    /// Mean of the ratings that are present
    pub fn average(&self) -> Option<f64> {
        let present: Vec<f64> = self
            .as_array()
            .iter()
            .flatten()
            .map(|&r| f64::from(r))
            .collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Productive/distracting minute split for one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenTimeSplit {
    pub productive_minutes: f64,
    pub distracting_minutes: f64,
    /// Number of apps logged, matched or not
    pub tracked_apps: u32,
}

impl ScreenTimeSplit {
    /// Whether any app usage was logged at all
    pub fn has_signal(&self) -> bool {
        self.tracked_apps > 0
    }
}

/// Canonical per-date feature row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Calendar date (`YYYY-MM-DD`) or the literal key of an unparsable date
    pub date: String,
    /// Fraction of the five prayers prayed on time (0-1)
    pub prayer_on_time: f64,
    /// Total ayahs recited, whole surahs resolved
    pub quran_ayahs: u64,
    pub dhikr_reps: u64,
    pub sadaqah_amount: f64,
    pub sleep_hours: f64,
    /// Bedtime as submitted, empty when not given
    pub bedtime: String,
    pub prod_minutes: f64,
    pub dist_minutes: f64,
    pub tracked_apps: u32,
    pub other_good: u32,
    pub other_bad: u32,
    pub clarity: Option<u8>,
    pub focus: Option<u8>,
    pub calm: Option<u8>,
    pub productivity: Option<u8>,
}

impl FeatureRecord {
    pub fn outcomes(&self) -> Outcomes {
        Outcomes {
            clarity: self.clarity,
            focus: self.focus,
            calm: self.calm,
            productivity: self.productivity,
        }
    }

    pub fn screen_time(&self) -> ScreenTimeSplit {
        ScreenTimeSplit {
            productive_minutes: self.prod_minutes,
            distracting_minutes: self.dist_minutes,
            tracked_apps: self.tracked_apps,
        }
    }

    pub fn bedtime(&self) -> Option<&str> {
        let trimmed = self.bedtime.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// One bounded score per component, all in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub prayer_on_time: f64,
    pub quran_recitation: f64,
    pub dhikr: f64,
    pub sadaqah: f64,
    pub sleep: f64,
    pub screen_time: f64,
    pub other_good: f64,
    pub other_bad: f64,
}

impl ComponentScores {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::PrayerOnTime => self.prayer_on_time,
            Component::QuranRecitation => self.quran_recitation,
            Component::Dhikr => self.dhikr,
            Component::Sadaqah => self.sadaqah,
            Component::Sleep => self.sleep,
            Component::ScreenTime => self.screen_time,
            Component::OtherGood => self.other_good,
            Component::OtherBad => self.other_bad,
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Component::ALL
            .into_iter()
            .map(|c| (c.as_str().to_string(), self.get(c)))
            .collect()
    }
}

/// Persisted score row for one date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub date: String,
    pub prayer_on_time: f64,
    pub quran_recitation: f64,
    pub dhikr: f64,
    pub sadaqah: f64,
    pub sleep: f64,
    pub screen_time: f64,
    pub other_good: f64,
    pub other_bad: f64,
    /// Weighted composite of the components
    pub baraka_score: f64,
    pub clarity: Option<u8>,
    pub focus: Option<u8>,
    pub calm: Option<u8>,
    pub productivity: Option<u8>,
}

impl ScoreRecord {
    pub fn new(
        date: String,
        components: &ComponentScores,
        baraka_score: f64,
        outcomes: Outcomes,
    ) -> Self {
        Self {
            date,
            prayer_on_time: components.prayer_on_time,
            quran_recitation: components.quran_recitation,
            dhikr: components.dhikr,
            sadaqah: components.sadaqah,
            sleep: components.sleep,
            screen_time: components.screen_time,
            other_good: components.other_good,
            other_bad: components.other_bad,
            baraka_score,
            clarity: outcomes.clarity,
            focus: outcomes.focus,
            calm: outcomes.calm,
            productivity: outcomes.productivity,
        }
    }

    pub fn components(&self) -> ComponentScores {
        ComponentScores {
            prayer_on_time: self.prayer_on_time,
            quran_recitation: self.quran_recitation,
            dhikr: self.dhikr,
            sadaqah: self.sadaqah,
            sleep: self.sleep,
            screen_time: self.screen_time,
            other_good: self.other_good,
            other_bad: self.other_bad,
        }
    }

    pub fn outcomes(&self) -> Outcomes {
        Outcomes {
            clarity: self.clarity,
            focus: self.focus,
            calm: self.calm,
            productivity: self.productivity,
        }
    }
}

/// Outcome projection row (date + ratings)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub date: String,
    pub clarity: Option<u8>,
    pub focus: Option<u8>,
    pub calm: Option<u8>,
    pub productivity: Option<u8>,
}

impl From<&ScoreRecord> for OutcomeRecord {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            date: record.date.clone(),
            clarity: record.clarity,
            focus: record.focus,
            calm: record.calm,
            productivity: record.productivity,
        }
    }
}
