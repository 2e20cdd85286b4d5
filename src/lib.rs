//! Barakah Score - Daily spiritual and lifestyle composite scoring
//!
//! Barakah turns a log of daily self-reported activities into per-component
//! scores and a weighted daily composite through a deterministic batch
//! pipeline: lenient decoding → normalization → feature building → component
//! scoring → weighted aggregation. An analyzer then relates the activity
//! features to self-rated outcomes.
//!
//! ## Modules
//!
//! - **Scoring Pipeline**: raw daily entries into feature, score and outcome tables
//! - **Outcome Model**: correlations and a cross-validated ridge fit of
//!   activities against averaged outcome ratings

pub mod aggregator;
pub mod config;
pub mod error;
pub mod features;
pub mod insights;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod scoring;
pub mod store;
pub mod surah;
pub mod tables;
pub mod types;

pub use aggregator::weighted_composite;
pub use config::Config;
pub use error::ComputeError;
pub use features::FeatureBuilder;
pub use model::{ModelReport, ModelStatus, OutcomeAnalyzer};
pub use pipeline::{compute_scores, log_to_scores_json, ScoreTables};
pub use schema::{parse_log_array, RawLogEntry, Recitation};
pub use scoring::ComponentScorer;
pub use types::{Component, ComponentScores, FeatureRecord, OutcomeRecord, ScoreRecord};

/// Crate version embedded in model reports
pub const BARAKAH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for model reports
pub const PRODUCER_NAME: &str = "barakah-score";
