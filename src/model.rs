//! Outcome modeling
//!
//! Relates daily activity features to the self-rated outcomes. The analyzer
//! always returns a report; its `status` says how far it got:
//! - `no_data`: there are no feature rows at all
//! - `insufficient_data`: too few outcome-bearing rows, correlations only
//! - `ok`: ridge regression fitted with k-fold cross-validation
//! - `error`: fitting failed; the message is carried in the report

use crate::config::ModelPolicy;
use crate::error::ComputeError;
use crate::types::{FeatureRecord, Outcomes};
use crate::{BARAKAH_VERSION, PRODUCER_NAME};
use chrono::Utc;
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_elasticnet::ElasticNet;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Activity features fed to the model, in column order
pub const ACTIVITY_FEATURES: [&str; 9] = [
    "prayer_on_time",
    "quran_ayahs",
    "dhikr_reps",
    "sadaqah_amount",
    "sleep_hours",
    "prod_minutes",
    "dist_minutes",
    "other_good",
    "other_bad",
];

fn activity_vector(record: &FeatureRecord) -> [f64; 9] {
    [
        record.prayer_on_time,
        record.quran_ayahs as f64,
        record.dhikr_reps as f64,
        record.sadaqah_amount,
        record.sleep_hours,
        record.prod_minutes,
        record.dist_minutes,
        f64::from(record.other_good),
        f64::from(record.other_bad),
    ]
}

/// Terminal state of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    NoData,
    InsufficientData,
    Ok,
    Error,
}

/// Report producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub producer: String,
    pub version: String,
    pub run_id: String,
    pub computed_at_utc: String,
}

/// Model report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub status: ModelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_r2_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_r2_std: Option<f64>,
    /// Feature → non-negative importance, summing to 1 (or all 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_importances: Option<BTreeMap<String, f64>>,
    /// Feature → Pearson correlation with the averaged outcome (`ok` reports)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations_with_outcome: Option<BTreeMap<String, f64>>,
    /// Same correlations, reported when no model was fitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlations: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ReportMeta>,
}

impl ModelReport {
    fn with_status(status: ModelStatus) -> Self {
        Self {
            status,
            cv_r2_mean: None,
            cv_r2_std: None,
            feature_importances: None,
            correlations_with_outcome: None,
            correlations: None,
            n_samples: None,
            error_message: None,
            meta: None,
        }
    }

    pub fn no_data() -> Self {
        Self::with_status(ModelStatus::NoData)
    }

    pub fn insufficient(correlations: BTreeMap<String, f64>) -> Self {
        Self {
            correlations: Some(correlations),
            ..Self::with_status(ModelStatus::InsufficientData)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::with_status(ModelStatus::Error)
        }
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(ComputeError::JsonError)
    }
}

/// Outcome analyzer
pub struct OutcomeAnalyzer {
    policy: ModelPolicy,
    run_id: String,
}

impl Default for OutcomeAnalyzer {
    fn default() -> Self {
        Self::new(ModelPolicy::default())
    }
}

impl OutcomeAnalyzer {
    /// Create an analyzer with a unique run ID
    pub fn new(policy: ModelPolicy) -> Self {
        Self {
            policy,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an analyzer with a specific run ID
    pub fn with_run_id(policy: ModelPolicy, run_id: String) -> Self {
        Self { policy, run_id }
    }

    /// Analyze the feature table. Never fails; problems become the `error`
    /// status.
    pub fn analyze(&self, features: &[FeatureRecord]) -> ModelReport {
        let mut report = self.analyze_inner(features);
        report.meta = Some(ReportMeta {
            producer: PRODUCER_NAME.to_string(),
            version: BARAKAH_VERSION.to_string(),
            run_id: self.run_id.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
        });
        report
    }

    fn analyze_inner(&self, features: &[FeatureRecord]) -> ModelReport {
        if features.is_empty() {
            return ModelReport::no_data();
        }

        let samples: Vec<(&FeatureRecord, f64)> = features
            .iter()
            .filter_map(|r| r.outcomes().average().map(|avg| (r, avg)))
            .collect();
        let correlations = outcome_correlations(&samples);

        let required = self.policy.min_samples.max(2);
        if samples.len() < required {
            tracing::info!(
                samples = samples.len(),
                required,
                "not enough outcome-bearing days to fit a model"
            );
            return ModelReport::insufficient(correlations);
        }

        match self.fit(&samples) {
            Ok(fit) => {
                tracing::info!(
                    samples = samples.len(),
                    cv_r2_mean = fit.cv_mean,
                    "fitted outcome model"
                );
                ModelReport {
                    cv_r2_mean: Some(fit.cv_mean),
                    cv_r2_std: Some(fit.cv_std),
                    feature_importances: Some(fit.importances),
                    correlations_with_outcome: Some(correlations),
                    n_samples: Some(samples.len()),
                    ..ModelReport::with_status(ModelStatus::Ok)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "outcome model fitting failed");
                ModelReport::failed(e.to_string())
            }
        }
    }

    fn fit(&self, samples: &[(&FeatureRecord, f64)]) -> Result<FitSummary, ComputeError> {
        let n = samples.len();
        let flat: Vec<f64> = samples
            .iter()
            .flat_map(|(record, _)| activity_vector(record))
            .collect();
        if flat.iter().any(|v| !v.is_finite()) {
            return Err(ComputeError::ModelError(
                "feature table contains non-finite values".to_string(),
            ));
        }

        let records = Array2::from_shape_vec((n, ACTIVITY_FEATURES.len()), flat)
            .map_err(|e| ComputeError::ModelError(e.to_string()))?;
        let targets: Array1<f64> = samples.iter().map(|(_, avg)| *avg).collect();

        let folds = self.policy.max_folds.min(n).max(2);
        let mut fold_scores = Vec::with_capacity(folds);
        for (train, test) in kfold_indices(n, folds) {
            let model = RidgeModel::fit(
                &records.select(Axis(0), &train),
                &targets.select(Axis(0), &train),
                self.policy.ridge_penalty,
            )?;
            let predicted = model.predict(&records.select(Axis(0), &test));
            fold_scores.push(r2_score(&targets.select(Axis(0), &test), &predicted));
        }

        let full = RidgeModel::fit(&records, &targets, self.policy.ridge_penalty)?;
        let importances = ACTIVITY_FEATURES
            .iter()
            .map(|name| name.to_string())
            .zip(full.importances())
            .collect();

        let cv_mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        let cv_std = (fold_scores
            .iter()
            .map(|s| (s - cv_mean).powi(2))
            .sum::<f64>()
            / fold_scores.len() as f64)
            .sqrt();

        if !cv_mean.is_finite() || !cv_std.is_finite() {
            return Err(ComputeError::ModelError(
                "cross-validation produced non-finite scores".to_string(),
            ));
        }

        Ok(FitSummary {
            cv_mean,
            cv_std,
            importances,
        })
    }
}

struct FitSummary {
    cv_mean: f64,
    cv_std: f64,
    importances: BTreeMap<String, f64>,
}

/// Ridge regression on z-scored features
struct RidgeModel {
    mean: Array1<f64>,
    scale: Array1<f64>,
    net: ElasticNet<f64>,
}

impl RidgeModel {
    fn fit(records: &Array2<f64>, targets: &Array1<f64>, penalty: f64) -> Result<Self, ComputeError> {
        let mean = records
            .mean_axis(Axis(0))
            .ok_or_else(|| ComputeError::ModelError("no training rows".to_string()))?;
        // Constant columns keep unit scale and standardize to all zeros
        let scale = records
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });

        let standardized = (records - &mean) / &scale;
        let dataset = Dataset::new(standardized, targets.clone());
        let net = ElasticNet::params()
            .penalty(penalty)
            .l1_ratio(0.0)
            .fit(&dataset)
            .map_err(|e| ComputeError::ModelError(e.to_string()))?;

        Ok(Self { mean, scale, net })
    }

    fn predict(&self, records: &Array2<f64>) -> Array1<f64> {
        let standardized = (records - &self.mean) / &self.scale;
        self.net.predict(&standardized)
    }

    /// Absolute standardized coefficients normalized to sum 1
    fn importances(&self) -> Vec<f64> {
        let magnitudes: Vec<f64> = self.net.hyperplane().iter().map(|c| c.abs()).collect();
        let total: f64 = magnitudes.iter().sum();
        magnitudes
            .into_iter()
            .map(|m| if total > 0.0 { round6(m / total) } else { 0.0 })
            .collect()
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Contiguous k-fold split; the first `n % k` folds get one extra row.
fn kfold_indices(n: usize, k: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|fold| {
            let size = base + usize::from(fold < extra);
            let test: Vec<usize> = (start..start + size).collect();
            let train: Vec<usize> = (0..start).chain(start + size..n).collect();
            start += size;
            (train, test)
        })
        .collect()
}

/// Coefficient of determination. A constant truth scores 1 when predicted
/// exactly and 0 otherwise, so a single fold cannot produce infinities.
fn r2_score(truth: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let Some(mean) = truth.mean() else {
        return 0.0;
    };
    let ss_res: f64 = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Pearson correlation over paired values; 0 when undefined
fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Correlation of each activity feature and each rating with the averaged
/// outcome, over the rows where both are present.
fn outcome_correlations(samples: &[(&FeatureRecord, f64)]) -> BTreeMap<String, f64> {
    let mut correlations = BTreeMap::new();

    for (col, name) in ACTIVITY_FEATURES.iter().enumerate() {
        let pairs: Vec<(f64, f64)> = samples
            .iter()
            .map(|(record, avg)| (activity_vector(record)[col], *avg))
            .collect();
        correlations.insert(name.to_string(), pearson(&pairs));
    }

    for (col, name) in Outcomes::NAMES.iter().enumerate() {
        let pairs: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|(record, avg)| {
                record.outcomes().as_array()[col].map(|r| (f64::from(r), *avg))
            })
            .collect();
        correlations.insert(name.to_string(), pearson(&pairs));
    }

    correlations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(i: usize, with_outcome: bool) -> FeatureRecord {
        let rating = (1 + i % 4) as u8;
        FeatureRecord {
            date: format!("2024-01-{:02}", i + 1),
            prayer_on_time: (i % 5) as f64 / 5.0,
            quran_ayahs: (i % 3) as u64 * 10,
            dhikr_reps: 100,
            sleep_hours: 5.0 + (i % 4) as f64,
            dist_minutes: ((i * 7) % 11) as f64,
            clarity: with_outcome.then_some(rating),
            focus: with_outcome.then_some(rating),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_id_is_recorded() {
        let analyzer = OutcomeAnalyzer::with_run_id(ModelPolicy::default(), "nightly-7".to_string());
        let meta = analyzer.analyze(&[]).meta.unwrap();
        assert_eq!(meta.run_id, "nightly-7");
        assert_eq!(meta.producer, PRODUCER_NAME);

        let fresh = OutcomeAnalyzer::default().analyze(&[]).meta.unwrap();
        assert!(Uuid::parse_str(&fresh.run_id).is_ok());
    }

    #[test]
    fn test_no_data() {
        let report = OutcomeAnalyzer::default().analyze(&[]);
        assert_eq!(report.status, ModelStatus::NoData);
        assert!(report.correlations.is_none());
        assert!(report.meta.is_some());
    }

    #[test]
    fn test_insufficient_data_reports_correlations_only() {
        let days: Vec<FeatureRecord> = (0..6).map(|i| day(i, true)).collect();
        let report = OutcomeAnalyzer::default().analyze(&days);

        assert_eq!(report.status, ModelStatus::InsufficientData);
        let correlations = report.correlations.as_ref().unwrap();
        assert!((correlations["sleep_hours"] - 1.0).abs() < 1e-9);
        assert_eq!(correlations["dhikr_reps"], 0.0);
        assert!(report.cv_r2_mean.is_none());
        assert!(report.feature_importances.is_none());
        assert!(report.correlations_with_outcome.is_none());
        assert!(report.n_samples.is_none());

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert!(json.get("correlations").is_some());
        assert!(json.get("cv_r2_mean").is_none());
    }

    #[test]
    fn test_rows_without_outcomes_do_not_count() {
        let days: Vec<FeatureRecord> = (0..30).map(|i| day(i, i % 5 == 0)).collect();
        let report = OutcomeAnalyzer::default().analyze(&days);
        assert_eq!(report.status, ModelStatus::InsufficientData);
    }

    #[test]
    fn test_fits_model_with_enough_rows() {
        let days: Vec<FeatureRecord> = (0..20).map(|i| day(i, true)).collect();
        let report = OutcomeAnalyzer::default().analyze(&days);

        assert_eq!(report.status, ModelStatus::Ok, "{:?}", report.error_message);
        assert_eq!(report.n_samples, Some(20));

        let mean = report.cv_r2_mean.unwrap();
        let std = report.cv_r2_std.unwrap();
        assert!(mean.is_finite() && mean <= 1.0);
        assert!(std >= 0.0);

        let importances = report.feature_importances.as_ref().unwrap();
        assert_eq!(importances.len(), ACTIVITY_FEATURES.len());
        assert!(importances.values().all(|v| *v >= 0.0));
        let total: f64 = importances.values().sum();
        assert!((total - 1.0).abs() < 1e-4);
        let top = importances
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k.as_str());
        assert_eq!(top, Some("sleep_hours"));

        let correlations = report.correlations_with_outcome.as_ref().unwrap();
        assert!(correlations.values().all(|c| (-1.0..=1.0).contains(c)));
        assert!(report.correlations.is_none());
    }

    #[test]
    fn test_non_finite_features_become_error_status() {
        let mut days: Vec<FeatureRecord> = (0..12).map(|i| day(i, true)).collect();
        days[3].sleep_hours = f64::NAN;

        let report = OutcomeAnalyzer::default().analyze(&days);
        assert_eq!(report.status, ModelStatus::Error);
        assert!(report.error_message.unwrap().contains("non-finite"));
    }

    #[test]
    fn test_kfold_partitions_rows() {
        let folds = kfold_indices(11, 5);
        assert_eq!(folds.len(), 5);
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2, 2, 2]);

        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..11).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 11);
            assert!(test.iter().all(|t| !train.contains(t)));
        }
    }

    #[test]
    fn test_r2_score() {
        let truth = Array1::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(r2_score(&truth, &truth), 1.0);
        let flat = Array1::from(vec![2.0, 2.0, 2.0]);
        assert!((r2_score(&truth, &flat)).abs() < 1e-12);
        assert_eq!(r2_score(&flat, &truth), 0.0);
        assert_eq!(r2_score(&flat, &flat), 1.0);
    }

    #[test]
    fn test_pearson() {
        assert!((pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[(1.0, 1.0), (1.0, 2.0)]), 0.0);
        assert_eq!(pearson(&[(1.0, 1.0)]), 0.0);
    }
}
