use std::collections::HashMap;

use crate::error::{PredictionError, Result};
use crate::prediction::Prediction;
use crate::store::ColumnStore;

/// Clamp bound keeping `ln` finite in the logloss.
const LOGLOSS_EPSILON: f64 = 1e-15;

// ---------------------------------------------------------------------------
// ValidationTargets – held-out ground truth
// ---------------------------------------------------------------------------

/// Ground-truth values keyed by row id, supplied by the dataset side.
#[derive(Debug, Clone)]
pub struct ValidationTargets {
    store: ColumnStore,
}

impl ValidationTargets {
    /// Targets for a validation split.  Row ids must be unique and as
    /// numerous as the values.
    pub fn new(row_ids: Vec<String>, y: Vec<f64>) -> Result<Self> {
        Ok(Self {
            store: ColumnStore::from_column(row_ids, "y", y)?,
        })
    }

    pub fn row_ids(&self) -> &[String] {
        self.store.row_ids()
    }

    pub fn y(&self) -> &[f64] {
        self.store.column("y").expect("targets always hold y")
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Summary metrics for one model against the validation targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScore {
    pub name: String,
    /// Mean negative log likelihood; lower is better.
    pub logloss: f64,
    /// Agreement with the targets at a 0.5 threshold.
    pub accuracy: f64,
    /// Standard deviation of the model's predictions.
    pub ystd: f64,
}

/// Outcome of a pairwise model comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Dominance {
    pub first: String,
    pub second: String,
    pub first_logloss: f64,
    pub second_logloss: f64,
}

impl Dominance {
    /// Name of the model with the lower logloss, or `None` on an exact
    /// tie.
    pub fn winner(&self) -> Option<&str> {
        if self.first_logloss < self.second_logloss {
            Some(&self.first)
        } else if self.second_logloss < self.first_logloss {
            Some(&self.second)
        } else {
            None
        }
    }
}

/// Score every model of `prediction` against `targets`.
///
/// The row-id sets must match exactly; targets are realigned to the
/// prediction's row order by id before any metric is computed.
pub fn performance(
    prediction: &Prediction,
    targets: &ValidationTargets,
) -> Result<Vec<ModelScore>> {
    let y = aligned_targets(prediction, targets)?;
    prediction
        .names()
        .iter()
        .map(|&name| {
            let values = prediction.column(name)?;
            Ok(ModelScore {
                name: name.to_string(),
                logloss: logloss(values, &y),
                accuracy: accuracy(values, &y),
                ystd: std_dev(values),
            })
        })
        .collect()
}

/// Compare exactly two models pairwise under the logloss.
pub fn dominance(prediction: &Prediction, targets: &ValidationTargets) -> Result<Dominance> {
    let names = prediction.names();
    if names.len() != 2 {
        return Err(PredictionError::DominanceRequiresPair(names.len()));
    }
    let y = aligned_targets(prediction, targets)?;
    Ok(Dominance {
        first: names[0].to_string(),
        second: names[1].to_string(),
        first_logloss: logloss(prediction.column(names[0])?, &y),
        second_logloss: logloss(prediction.column(names[1])?, &y),
    })
}

/// Target values reordered to the prediction's row order.  Fails with
/// [`PredictionError::RowIdMismatch`] unless the id sets match exactly.
fn aligned_targets(prediction: &Prediction, targets: &ValidationTargets) -> Result<Vec<f64>> {
    let pred_ids = prediction.row_ids();
    let target_ids = targets.row_ids();
    if pred_ids.len() != target_ids.len() {
        return Err(PredictionError::RowIdMismatch);
    }
    let positions: HashMap<&str, usize> = target_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let y = targets.y();
    pred_ids
        .iter()
        .map(|id| {
            positions
                .get(id.as_str())
                .map(|&i| y[i])
                .ok_or(PredictionError::RowIdMismatch)
        })
        .collect()
}

fn logloss(p: &[f64], y: &[f64]) -> f64 {
    if p.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = p
        .iter()
        .zip(y)
        .map(|(&pi, &yi)| {
            let pi = pi.clamp(LOGLOSS_EPSILON, 1.0 - LOGLOSS_EPSILON);
            -(yi * pi.ln() + (1.0 - yi) * (1.0 - pi).ln())
        })
        .sum();
    sum / p.len() as f64
}

fn accuracy(p: &[f64], y: &[f64]) -> f64 {
    if p.is_empty() {
        return f64::NAN;
    }
    let hits = p
        .iter()
        .zip(y)
        .filter(|&(&pi, &yi)| (pi > 0.5) == (yi > 0.5))
        .count();
    hits as f64 / p.len() as f64
}

fn std_dev(p: &[f64]) -> f64 {
    if p.is_empty() {
        return f64::NAN;
    }
    let mean = p.iter().sum::<f64>() / p.len() as f64;
    let var = p.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / p.len() as f64;
    var.sqrt()
}
