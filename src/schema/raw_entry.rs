//! Raw daily log entry schema
//!
//! One submission from the daily form. Dates may repeat across submissions;
//! the Feature Builder resolves duplicates. Every field but `date` is optional
//! and decodes leniently (see [`super::lenient`]).

use crate::error::ComputeError;
use crate::normalizer::{self, DateKey};
use crate::schema::lenient;
use crate::surah;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single recitation item: a surah and the ayahs read from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recitation {
    /// Surah name as typed (e.g. "Al-Kahf")
    #[serde(default, deserialize_with = "lenient::string")]
    pub surah: String,
    /// Ayahs read; 0 means the whole surah
    #[serde(default, deserialize_with = "lenient::small_count")]
    pub ayahs: u32,
}

impl Recitation {
    pub fn new(surah: impl Into<String>, ayahs: u32) -> Self {
        Self {
            surah: surah.into(),
            ayahs,
        }
    }

    /// Ayahs this item contributes, resolving "whole surah" through the
    /// reference table. Unknown surahs resolve to 0.
    pub fn resolved_ayahs(&self) -> u32 {
        if self.ayahs > 0 {
            self.ayahs
        } else {
            surah::ayah_count(&self.surah).unwrap_or(0)
        }
    }
}

/// One daily form submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLogEntry {
    /// Calendar date as submitted (normally `YYYY-MM-DD`)
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,

    #[serde(rename = "Fajr", alias = "fajr", default, deserialize_with = "lenient::flag")]
    pub fajr: bool,
    #[serde(rename = "Dhuhr", alias = "dhuhr", default, deserialize_with = "lenient::flag")]
    pub dhuhr: bool,
    #[serde(rename = "Asr", alias = "asr", default, deserialize_with = "lenient::flag")]
    pub asr: bool,
    #[serde(rename = "Maghrib", alias = "maghrib", default, deserialize_with = "lenient::flag")]
    pub maghrib: bool,
    #[serde(rename = "Isha", alias = "isha", default, deserialize_with = "lenient::flag")]
    pub isha: bool,

    /// Qur'an recitations, in the order they were added
    #[serde(default, deserialize_with = "lenient::recitations")]
    pub quran_recs: Vec<Recitation>,

    /// Total dhikr repetitions across all adhkar
    #[serde(default, deserialize_with = "lenient::count")]
    pub dhikr_reps: u64,

    /// Sadaqah given (currency agnostic)
    #[serde(default, deserialize_with = "lenient::amount")]
    pub sadaqah_amount: f64,

    /// Sleep duration in hours
    #[serde(default, deserialize_with = "lenient::amount")]
    pub sleep_hours: f64,

    /// Bedtime as 24h `HH:MM`
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub bedtime: Option<String>,

    /// Minutes used per app
    #[serde(default, deserialize_with = "lenient::app_minutes")]
    pub app_minutes: BTreeMap<String, f64>,

    #[serde(default, deserialize_with = "lenient::small_count")]
    pub other_good: u32,
    #[serde(default, deserialize_with = "lenient::small_count")]
    pub other_bad: u32,

    #[serde(default, deserialize_with = "lenient::rating")]
    pub clarity: Option<u8>,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub focus: Option<u8>,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub calm: Option<u8>,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub productivity: Option<u8>,
}

impl RawLogEntry {
    /// Create an empty entry for a date
    pub fn for_date(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Default::default()
        }
    }

    /// Decode one entry object.
    ///
    /// Prayer keys match ignoring ASCII case. When an object spells one prayer
    /// several ways, the canonical spelling (`Fajr`) wins, else the first in
    /// key order; the others are dropped rather than failing the entry.
    pub fn from_value(value: Value) -> Result<Self, ComputeError> {
        let Value::Object(mut fields) = value else {
            return Err(ComputeError::ParseError(
                "log entry must be a JSON object".to_string(),
            ));
        };
        canonicalize_prayer_keys(&mut fields);
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Prayer flags in canonical order (Fajr, Dhuhr, Asr, Maghrib, Isha)
    pub fn prayer_flags(&self) -> [bool; 5] {
        [self.fajr, self.dhuhr, self.asr, self.maghrib, self.isha]
    }

    /// Non-fatal problems with this entry. The pipeline scores the entry anyway,
    /// substituting defaults; this exists for reporting.
    pub fn issues(&self) -> Vec<EntryIssue> {
        let mut issues = Vec::new();

        match normalizer::normalize_date(&self.date) {
            DateKey::Missing => issues.push(EntryIssue::MissingDate),
            DateKey::Literal(raw) => issues.push(EntryIssue::UnparsableDate(raw)),
            DateKey::Calendar(_) => {}
        }

        if let Some(bedtime) = &self.bedtime {
            if normalizer::parse_clock(bedtime).is_none() {
                issues.push(EntryIssue::MalformedBedtime(bedtime.clone()));
            }
        }

        for rec in &self.quran_recs {
            if rec.ayahs == 0 && surah::ayah_count(&rec.surah).is_none() {
                issues.push(EntryIssue::UnknownSurah(rec.surah.clone()));
            }
        }

        issues
    }
}

/// Problems found in a raw entry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryIssue {
    #[error("Entry has no date; it will be skipped")]
    MissingDate,

    #[error("Date '{0}' is not a calendar date; it is kept as a literal key")]
    UnparsableDate(String),

    #[error("Bedtime '{0}' is not HH:MM; no bedtime bonus applies")]
    MalformedBedtime(String),

    #[error("Surah '{0}' is not in the reference table; it counts 0 ayahs")]
    UnknownSurah(String),
}

fn canonicalize_prayer_keys(fields: &mut Map<String, Value>) {
    for prayer in normalizer::PRAYERS {
        let variants: Vec<String> = fields
            .keys()
            .filter(|key| key.as_str() != prayer && key.trim().eq_ignore_ascii_case(prayer))
            .cloned()
            .collect();

        for variant in variants {
            if let Some(value) = fields.remove(&variant) {
                if !fields.contains_key(prayer) {
                    fields.insert(prayer.to_string(), value);
                }
            }
        }
    }
}

/// Parse a JSON array of raw entries.
///
/// Elements that are not JSON objects are skipped with a warning; the input as a
/// whole must still be an array.
pub fn parse_log_array(json: &str) -> Result<Vec<RawLogEntry>, ComputeError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(ComputeError::ParseError(
            "daily log must be a JSON array of entries".to_string(),
        ));
    };

    let mut entries = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!(index = idx, "skipping log entry that is not a JSON object");
            continue;
        }
        match RawLogEntry::from_value(item) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(index = idx, error = %e, "skipping undecodable log entry"),
        }
    }

    Ok(entries)
}
