//! Evaluation metrics for binary classification.

use crate::core::error::{Result, SpdtError};
use crate::core::types::Label;

/// Fraction of predictions matching the actual labels.
pub fn accuracy(predicted: &[Label], actual: &[Label]) -> Result<f64> {
    check_lengths(predicted, actual)?;
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Summary statistics over a set of binary predictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryClassificationMetrics {
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// True positives over predicted positives (1.0 when none predicted).
    pub precision: f64,
    /// True positives over actual positives (1.0 when none present).
    pub recall: f64,
    /// Harmonic mean of precision and recall (0.0 when both are 0).
    pub f1: f64,
}

impl BinaryClassificationMetrics {
    /// Computes the full metric set from parallel label slices.
    pub fn compute(predicted: &[Label], actual: &[Label]) -> Result<Self> {
        check_lengths(predicted, actual)?;
        let mut true_pos = 0usize;
        let mut false_pos = 0usize;
        let mut false_neg = 0usize;
        let mut correct = 0usize;
        for (p, a) in predicted.iter().zip(actual) {
            match (p.is_positive(), a.is_positive()) {
                (true, true) => {
                    true_pos += 1;
                    correct += 1;
                }
                (true, false) => false_pos += 1,
                (false, true) => false_neg += 1,
                (false, false) => correct += 1,
            }
        }
        let precision = if true_pos + false_pos == 0 {
            1.0
        } else {
            true_pos as f64 / (true_pos + false_pos) as f64
        };
        let recall = if true_pos + false_neg == 0 {
            1.0
        } else {
            true_pos as f64 / (true_pos + false_neg) as f64
        };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Ok(BinaryClassificationMetrics {
            accuracy: correct as f64 / actual.len() as f64,
            precision,
            recall,
            f1,
        })
    }
}

fn check_lengths(predicted: &[Label], actual: &[Label]) -> Result<()> {
    if predicted.len() != actual.len() {
        return Err(SpdtError::prediction(format!(
            "prediction/label length mismatch: {} vs {}",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(SpdtError::prediction("cannot evaluate an empty label set"));
    }
    Ok(())
}
