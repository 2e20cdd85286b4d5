//! File-backed storage
//!
//! A data directory holds the append-only raw log, the config document and
//! the derived artifacts:
//!
//! ```text
//! <root>/config/config.json
//! <root>/data/raw/daily_logs.json
//! <root>/data/processed/daily_features.csv
//! <root>/data/processed/baraka_scores.csv
//! <root>/data/processed/outcomes.csv
//! <root>/models/feature_importances.json
//! ```
//!
//! A missing log reads as empty and a missing config reads as the default.

use crate::config::Config;
use crate::error::ComputeError;
use crate::model::ModelReport;
use crate::pipeline::ScoreTables;
use crate::schema::{parse_log_array, RawLogEntry};
use crate::tables;
use crate::types::FeatureRecord;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

const FEATURES_FILE: &str = "daily_features.csv";

/// Layout of a data directory
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config").join("config.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("data").join("raw").join("daily_logs.json")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("data").join("processed")
    }

    pub fn model_report_path(&self) -> PathBuf {
        self.root.join("models").join("feature_importances.json")
    }

    pub fn log_store(&self) -> LogStore {
        LogStore::new(self.log_path())
    }

    pub fn load_config(&self) -> Result<Config, ComputeError> {
        load_config(&self.config_path())
    }

    pub fn save_config(&self, config: &Config) -> Result<(), ComputeError> {
        save_json(&self.config_path(), config)
    }

    /// Write the three CSV tables under `data/processed`
    pub fn save_tables(&self, tables: &ScoreTables) -> Result<(), ComputeError> {
        let dir = self.processed_dir();
        fs::create_dir_all(&dir)?;

        tables::write_features(
            BufWriter::new(File::create(dir.join(FEATURES_FILE))?),
            &tables.features,
        )?;
        tables::write_scores(
            BufWriter::new(File::create(dir.join("baraka_scores.csv"))?),
            &tables.scores,
        )?;
        tables::write_outcomes(
            BufWriter::new(File::create(dir.join("outcomes.csv"))?),
            &tables.outcomes(),
        )?;

        tracing::debug!(dir = %dir.display(), days = tables.scores.len(), "wrote score tables");
        Ok(())
    }

    /// Feature table written by [`save_tables`](Self::save_tables); empty when
    /// no table has been written yet
    pub fn load_features(&self) -> Result<Vec<FeatureRecord>, ComputeError> {
        let path = self.processed_dir().join(FEATURES_FILE);
        match File::open(&path) {
            Ok(file) => tables::read_features(BufReader::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no feature table yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_model_report(&self, report: &ModelReport) -> Result<(), ComputeError> {
        save_json(&self.model_report_path(), report)
    }
}

/// Append-only daily log kept as one JSON array
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All decodable entries in submission order
    pub fn load(&self) -> Result<Vec<RawLogEntry>, ComputeError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => parse_log_array(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one entry. Existing elements are written back untouched, even
    /// ones the decoder would skip.
    pub fn append(&self, entry: &RawLogEntry) -> Result<usize, ComputeError> {
        let mut items = self.load_values()?;
        items.push(serde_json::to_value(entry)?);
        save_json(&self.path, &items)?;

        tracing::debug!(path = %self.path.display(), entries = items.len(), "appended log entry");
        Ok(items.len())
    }

    fn load_values(&self) -> Result<Vec<Value>, ComputeError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&content)? {
            Value::Array(items) => Ok(items),
            _ => Err(ComputeError::ParseError(format!(
                "{} does not hold a JSON array",
                self.path.display()
            ))),
        }
    }
}

/// Load a config document; a missing file is the default config
pub fn load_config(path: &Path) -> Result<Config, ComputeError> {
    match fs::read_to_string(path) {
        Ok(content) => Config::from_json(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write a value as pretty JSON, creating parent directories
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ComputeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
