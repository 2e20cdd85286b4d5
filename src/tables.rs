//! Table export
//!
//! Writes the feature, score and outcome tables as CSV (one header row, one
//! row per date) and reads a feature table back. Missing ratings are empty
//! cells.

use crate::error::ComputeError;
use crate::types::{FeatureRecord, OutcomeRecord, ScoreRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Write any row type as CSV with a header
pub fn write_csv<W, T>(writer: W, rows: &[T]) -> Result<(), ComputeError>
where
    W: Write,
    T: Serialize,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn read_csv<R, T>(reader: R) -> Result<Vec<T>, ComputeError>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = csv::Reader::from_reader(reader);
    let rows = csv_reader
        .deserialize::<T>()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

pub fn write_features<W: Write>(writer: W, features: &[FeatureRecord]) -> Result<(), ComputeError> {
    write_csv(writer, features)
}

pub fn write_scores<W: Write>(writer: W, scores: &[ScoreRecord]) -> Result<(), ComputeError> {
    write_csv(writer, scores)
}

pub fn write_outcomes<W: Write>(writer: W, outcomes: &[OutcomeRecord]) -> Result<(), ComputeError> {
    write_csv(writer, outcomes)
}

/// Read a feature table previously written by [`write_features`]
pub fn read_features<R: Read>(reader: R) -> Result<Vec<FeatureRecord>, ComputeError> {
    read_csv(reader)
}

/// Render rows to a CSV string
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<String, ComputeError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| ComputeError::ParseError(e.to_string()))
}
