//! Leak classifier adapter.
//!
//! The scoring function is a logistic regression over the standardised
//! feature vector, trained once from a labeled CSV dataset and persisted as
//! JSON. Loading (or training) happens lazily behind a single exclusive
//! critical section; after that the model is immutable and predictions take
//! shared references only, so concurrent scoring needs no further locking.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::services::features::{LeakFeatureRecord, LEAK_TYPE_CONTINUOUS, LEAK_TYPE_NONE};
use crate::services::schedule::{BREAK_LUNCH, BREAK_SHORT};

/// Numeric inputs plus one-hot break type.
pub const FEATURE_DIM: usize = 17;

const TRAIN_EPOCHS: usize = 400;
const LEARNING_RATE: f64 = 0.1;
const L2_REG: f64 = 1e-4;

/// Classifier outputs attached to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LeakPrediction {
    pub probability: f64,
    pub is_leak_predicted: bool,
    pub severity: i32,
    pub leak_type: String,
}

/// Apply the decision threshold and severity ladder to a probability.
pub fn classify(probability: f64) -> LeakPrediction {
    let is_leak_predicted = probability >= 0.5;
    // The 0.4 and 0.6 arms share a class; downstream consumers depend on the
    // resulting four buckets, so the ladder is kept verbatim.
    let severity = if probability < 0.2 {
        0
    } else if probability < 0.4 {
        1
    } else if probability < 0.6 {
        1
    } else if probability < 0.8 {
        2
    } else {
        3
    };
    let leak_type = if is_leak_predicted {
        LEAK_TYPE_CONTINUOUS.to_string()
    } else {
        LEAK_TYPE_NONE.to_string()
    };
    LeakPrediction {
        probability,
        is_leak_predicted,
        severity,
        leak_type,
    }
}

/// Persisted model artifact. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    /// Per-feature standardisation parameters captured at training time.
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl LeakModel {
    /// Leak probability in [0, 1] for one feature record.
    pub fn predict_proba(&self, record: &LeakFeatureRecord) -> f64 {
        let x = vectorize(record);
        let mut logit = self.bias;
        for i in 0..FEATURE_DIM {
            let std = if self.stds[i] > 1e-9 { self.stds[i] } else { 1.0 };
            logit += self.weights[i] * (x[i] - self.means[i]) / std;
        }
        sigmoid(logit)
    }

    fn load(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("reading model file {} failed: {}", path.display(), e))?;
        let model: LeakModel = serde_json::from_str(&raw)
            .map_err(|e| format!("decoding model file {} failed: {}", path.display(), e))?;
        if model.weights.len() != FEATURE_DIM
            || model.means.len() != FEATURE_DIM
            || model.stds.len() != FEATURE_DIM
        {
            return Err(format!(
                "model file {} has wrong dimensionality (expected {})",
                path.display(),
                FEATURE_DIM
            ));
        }
        Ok(model)
    }

    fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("creating model directory failed: {}", e))?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|e| format!("encoding model failed: {}", e))?;
        fs::write(path, raw).map_err(|e| format!("writing model file {} failed: {}", path.display(), e))
    }
}

/// Lazy load-or-train wrapper around [`LeakModel`].
pub struct LeakModelService {
    model_path: PathBuf,
    training_data_path: PathBuf,
    model: RwLock<Option<Arc<LeakModel>>>,
}

impl LeakModelService {
    pub fn new(model_path: impl Into<PathBuf>, training_data_path: impl Into<PathBuf>) -> Self {
        LeakModelService {
            model_path: model_path.into(),
            training_data_path: training_data_path.into(),
            model: RwLock::new(None),
        }
    }

    /// Score one feature record. Loads (or trains) the model on first use.
    pub fn predict_leak_probability(&self, record: &LeakFeatureRecord) -> Result<f64, String> {
        let model = self.ensure_loaded()?;
        Ok(model.predict_proba(record))
    }

    fn ensure_loaded(&self) -> Result<Arc<LeakModel>, String> {
        if let Some(model) = self
            .model
            .read()
            .map_err(|_| "model lock poisoned".to_string())?
            .as_ref()
        {
            return Ok(Arc::clone(model));
        }

        let mut slot = self
            .model
            .write()
            .map_err(|_| "model lock poisoned".to_string())?;
        // Another caller may have won the race for the write lock.
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = if self.model_path.is_file() {
            info!("Loading leak model from {}", self.model_path.display());
            LeakModel::load(&self.model_path)?
        } else {
            info!(
                "No model at {}; training from {}",
                self.model_path.display(),
                self.training_data_path.display()
            );
            let records = load_training_data(&self.training_data_path)?;
            let model = train(&records)?;
            model.save(&self.model_path)?;
            model
        };

        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }
}

/// Read labeled records from the training CSV.
pub fn load_training_data(path: &Path) -> Result<Vec<LeakFeatureRecord>, String> {
    if !path.is_file() {
        return Err(format!("training data not found at {}", path.display()));
    }
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| format!("opening training data {} failed: {}", path.display(), e))?;
    let mut records = Vec::new();
    for row in reader.deserialize::<LeakFeatureRecord>() {
        let record = row.map_err(|e| format!("reading training data {} failed: {}", path.display(), e))?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(format!("training data {} contains no records", path.display()));
    }
    Ok(records)
}

/// Fit a logistic regression with full-batch gradient descent on
/// standardised features.
pub fn train(records: &[LeakFeatureRecord]) -> Result<LeakModel, String> {
    if records.is_empty() {
        return Err("cannot train on an empty dataset".to_string());
    }

    let n = records.len() as f64;
    let vectors: Vec<[f64; FEATURE_DIM]> = records.iter().map(vectorize).collect();
    let labels: Vec<f64> = records.iter().map(|r| if r.is_leak { 1.0 } else { 0.0 }).collect();

    let mut means = vec![0.0; FEATURE_DIM];
    for x in &vectors {
        for i in 0..FEATURE_DIM {
            means[i] += x[i] / n;
        }
    }
    let mut stds = vec![0.0; FEATURE_DIM];
    for x in &vectors {
        for i in 0..FEATURE_DIM {
            let d = x[i] - means[i];
            stds[i] += d * d / n;
        }
    }
    for s in stds.iter_mut() {
        *s = s.sqrt();
    }

    let standardized: Vec<[f64; FEATURE_DIM]> = vectors
        .iter()
        .map(|x| {
            let mut z = [0.0; FEATURE_DIM];
            for i in 0..FEATURE_DIM {
                let std = if stds[i] > 1e-9 { stds[i] } else { 1.0 };
                z[i] = (x[i] - means[i]) / std;
            }
            z
        })
        .collect();

    let mut weights = vec![0.0; FEATURE_DIM];
    let mut bias = 0.0;

    for _ in 0..TRAIN_EPOCHS {
        let mut grad_w = vec![0.0; FEATURE_DIM];
        let mut grad_b = 0.0;
        for (z, &y) in standardized.iter().zip(labels.iter()) {
            let mut logit = bias;
            for i in 0..FEATURE_DIM {
                logit += weights[i] * z[i];
            }
            let error = sigmoid(logit) - y;
            for i in 0..FEATURE_DIM {
                grad_w[i] += error * z[i] / n;
            }
            grad_b += error / n;
        }
        for i in 0..FEATURE_DIM {
            weights[i] -= LEARNING_RATE * (grad_w[i] + L2_REG * weights[i]);
        }
        bias -= LEARNING_RATE * grad_b;
    }

    Ok(LeakModel {
        weights,
        bias,
        means,
        stds,
    })
}

/// Fixed feature order shared by training and inference.
fn vectorize(record: &LeakFeatureRecord) -> [f64; FEATURE_DIM] {
    [
        record.pressure_current,
        record.pressure_previous_sensor,
        record.flow_rate,
        record.water_usage_diff,
        record.pressure_drop_rate,
        record.hour as f64,
        record.minute as f64,
        record.day_of_week as f64,
        if record.is_working_hours { 1.0 } else { 0.0 },
        if record.is_break_time { 1.0 } else { 0.0 },
        record.expected_usage_multiplier,
        record.minutes_since_break_start as f64,
        record.occupancy_level,
        record.pressure_vs_baseline,
        record.flow_vs_baseline,
        if record.break_type == BREAK_SHORT { 1.0 } else { 0.0 },
        if record.break_type == BREAK_LUNCH { 1.0 } else { 0.0 },
    ]
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pressure_current: f64, pressure_drop_rate: f64, is_leak: bool) -> LeakFeatureRecord {
        LeakFeatureRecord {
            timestamp: "2024-01-02 09:30:00".to_string(),
            sensor_id: 100,
            pipe_id: 10,
            zone_id: 1,
            pressure_current,
            pressure_previous_sensor: pressure_current + 1.0,
            flow_rate: if is_leak { 6.0 } else { 2.0 },
            water_usage_diff: if is_leak { 4.0 } else { 0.2 },
            pressure_drop_rate,
            hour: 9,
            minute: 30,
            day_of_week: 2,
            is_working_hours: true,
            is_break_time: false,
            break_type: "none".to_string(),
            expected_usage_multiplier: 1.3,
            minutes_since_break_start: 0,
            occupancy_level: 0.35,
            pressure_vs_baseline: if is_leak { -5.0 } else { 0.2 },
            flow_vs_baseline: if is_leak { 3.0 } else { 0.1 },
            is_leak,
            leak_severity: if is_leak { 2 } else { 0 },
            leak_type: if is_leak { "continuous" } else { "none" }.to_string(),
        }
    }

    fn separable_dataset() -> Vec<LeakFeatureRecord> {
        let mut records = Vec::new();
        for i in 0..30 {
            let jitter = (i % 7) as f64 * 0.1;
            records.push(record(42.0 + jitter, 0.01 * jitter, false));
            records.push(record(33.0 - jitter, -0.8 - 0.05 * jitter, true));
        }
        records
    }

    #[test]
    fn sigmoid_is_bounded_and_centered() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(20.0) > 0.999);
        assert!(sigmoid(-20.0) < 0.001);
    }

    #[test]
    fn severity_ladder_has_four_buckets() {
        assert_eq!(classify(0.0).severity, 0);
        assert_eq!(classify(0.19).severity, 0);
        assert_eq!(classify(0.2).severity, 1);
        assert_eq!(classify(0.39).severity, 1);
        // The 0.4 boundary does not open a new bucket.
        assert_eq!(classify(0.41).severity, 1);
        assert_eq!(classify(0.59).severity, 1);
        assert_eq!(classify(0.6).severity, 2);
        assert_eq!(classify(0.79).severity, 2);
        assert_eq!(classify(0.8).severity, 3);
        assert_eq!(classify(1.0).severity, 3);
    }

    #[test]
    fn non_zero_severity_below_decision_threshold() {
        let p = classify(0.45);
        assert_eq!(p.severity, 1);
        assert!(!p.is_leak_predicted);
        assert_eq!(p.leak_type, "none");
    }

    #[test]
    fn decision_threshold_is_inclusive() {
        let p = classify(0.5);
        assert!(p.is_leak_predicted);
        assert_eq!(p.leak_type, "continuous");
    }

    #[test]
    fn trains_to_separate_obvious_classes() {
        let model = train(&separable_dataset()).expect("training succeeds");
        assert!(model.predict_proba(&record(33.0, -0.8, true)) > 0.5);
        assert!(model.predict_proba(&record(42.0, 0.0, false)) < 0.5);
    }

    #[test]
    fn persisted_model_reloads_to_identical_predictions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_path = dir.path().join("models/leak_model.json");
        let model = train(&separable_dataset()).expect("training succeeds");
        model.save(&model_path).expect("save succeeds");

        let service = LeakModelService::new(&model_path, dir.path().join("missing.csv"));
        let probe = record(33.0, -0.8, true);
        let expected = model.predict_proba(&probe);
        let got = service.predict_leak_probability(&probe).expect("predict succeeds");
        assert!((expected - got).abs() < 1e-12);
    }

    #[test]
    fn trains_from_csv_and_persists_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("training.csv");
        let model_path = dir.path().join("leak_model.json");

        let mut writer = csv::Writer::from_path(&csv_path).expect("csv writer");
        for rec in separable_dataset() {
            writer.serialize(rec).expect("serialize row");
        }
        writer.flush().expect("flush");

        let service = LeakModelService::new(&model_path, &csv_path);
        let p_leak = service
            .predict_leak_probability(&record(33.0, -0.8, true))
            .expect("predict succeeds");
        let p_ok = service
            .predict_leak_probability(&record(42.0, 0.0, false))
            .expect("predict succeeds");
        assert!(p_leak > 0.5, "leak-shaped record scored {}", p_leak);
        assert!(p_ok < 0.5, "normal record scored {}", p_ok);
        assert!(model_path.is_file(), "model artifact persisted");
    }

    #[test]
    fn missing_model_and_training_data_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = LeakModelService::new(dir.path().join("nope.json"), dir.path().join("nope.csv"));
        let err = service
            .predict_leak_probability(&record(40.0, 0.0, false))
            .unwrap_err();
        assert!(err.contains("training data not found"), "unexpected error: {}", err);
    }
}
