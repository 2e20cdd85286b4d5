//! Daily insights
//!
//! Rule-based suggestions for the most recent scored day, and a small summary
//! of how much data the log holds.

use crate::pipeline::ScoreTables;
use crate::schema::RawLogEntry;
use crate::types::{Component, ScoreRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One actionable suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    PrayOnTime,
    TrimDistractions,
    AddRecitation,
    ProtectSleep,
    AddDhikr,
    /// Nothing fell below its threshold
    KeepGoing,
}

/// Component threshold below which a suggestion fires, in check order
const RULES: [(Component, f64, Suggestion); 5] = [
    (Component::PrayerOnTime, 80.0, Suggestion::PrayOnTime),
    (Component::ScreenTime, 60.0, Suggestion::TrimDistractions),
    (Component::QuranRecitation, 40.0, Suggestion::AddRecitation),
    (Component::Sleep, 70.0, Suggestion::ProtectSleep),
    (Component::Dhikr, 30.0, Suggestion::AddDhikr),
];

impl Suggestion {
    pub fn message(&self) -> &'static str {
        match self {
            Suggestion::PrayOnTime => "Aim to pray all five prayers on time tomorrow.",
            Suggestion::TrimDistractions => {
                "Cut about 20 minutes of distracting apps and spend them on Qur'an or reading."
            }
            Suggestion::AddRecitation => {
                "Add one short surah after Fajr, such as Al-Ikhlas, Al-Falaq or An-Nas."
            }
            Suggestion::ProtectSleep => "Target 7 to 8.5 hours of sleep with lights out before 23:00.",
            Suggestion::AddDhikr => "Spread 100 dhikr repetitions across the day.",
            Suggestion::KeepGoing => "Great momentum. Keep it consistent!",
        }
    }

    /// Component the suggestion targets
    pub fn component(&self) -> Option<Component> {
        RULES
            .iter()
            .find(|(_, _, s)| s == self)
            .map(|(component, _, _)| *component)
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Suggestions for one scored day; never empty.
pub fn suggestions(latest: &ScoreRecord) -> Vec<Suggestion> {
    let components = latest.components();
    let tips: Vec<Suggestion> = RULES
        .iter()
        .filter(|(component, threshold, _)| components.get(*component) < *threshold)
        .map(|(_, _, suggestion)| *suggestion)
        .collect();

    if tips.is_empty() {
        vec![Suggestion::KeepGoing]
    } else {
        tips
    }
}

/// Data summary of a log and its scored tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    /// Raw submissions, duplicates and undated entries included
    pub total_entries: usize,
    pub scored_days: usize,
    pub days_with_outcomes: usize,
    pub first_date: Option<String>,
    pub latest_date: Option<String>,
    pub latest_baraka_score: Option<f64>,
}

impl LogSummary {
    pub fn new(entries: &[RawLogEntry], tables: &ScoreTables) -> Self {
        Self {
            total_entries: entries.len(),
            scored_days: tables.scores.len(),
            days_with_outcomes: tables
                .scores
                .iter()
                .filter(|s| s.outcomes().any())
                .count(),
            first_date: tables.scores.first().map(|s| s.date.clone()),
            latest_date: tables.latest().map(|s| s.date.clone()),
            latest_baraka_score: tables.latest().map(|s| s.baraka_score),
        }
    }
}
