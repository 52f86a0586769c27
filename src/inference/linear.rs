//! Scoring for the generalized linear family.

use std::collections::BTreeMap;

use crate::repr::{GeneralizedLinearModel, LinkFunction};
use crate::utils::sigmoid;
use crate::vector::SparseVector;

use super::ClassPrediction;

/// Raw per-class score: `intercept + Σ coefficient[index] · value`.
///
/// Every coefficient is consulted exactly once per class; vector entries
/// beyond the coefficient table would be a builder defect and are
/// debug-asserted away.
fn class_score(model: &GeneralizedLinearModel, class: usize, vector: &SparseVector) -> f64 {
    debug_assert_eq!(
        vector.length,
        model.n_slots(),
        "vector length {} doesn't match coefficient table rows {}",
        vector.length,
        model.n_slots()
    );
    let coefficients = model.class_coefficients(class);
    let mut score = model.intercept(class);
    for (index, value) in vector.iter() {
        score += coefficients[index] * value;
    }
    score
}

/// Evaluate a linear/logistic/multinomial model against a sparse vector.
pub fn evaluate_linear(
    model: &GeneralizedLinearModel,
    vector: &SparseVector,
    debug: bool,
) -> ClassPrediction {
    let scores: Vec<f64> = (0..model.n_classes())
        .map(|c| class_score(model, c, vector))
        .collect();

    let (winner, calibrated) = match model.link() {
        LinkFunction::Logit => {
            // Two-class margin through the sigmoid, 0.5 threshold.
            let p = sigmoid(scores[0] - scores[1]);
            let winner = if p > 0.5 { 0 } else { 1 };
            (winner, vec![p, 1.0 - p])
        }
        LinkFunction::None => {
            // Uncalibrated margin against 0.
            let margin = scores[0] - scores[1];
            let winner = if margin > 0.0 { 0 } else { 1 };
            (winner, vec![margin, -margin])
        }
        LinkFunction::Softmax => {
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
            let total: f64 = exp.iter().sum();
            let probs: Vec<f64> = exp.iter().map(|e| e / total).collect();
            // First-declared category wins ties.
            let mut winner = 0;
            for (i, p) in probs.iter().enumerate().skip(1) {
                if *p > probs[winner] {
                    winner = i;
                }
            }
            (winner, probs)
        }
    };

    ClassPrediction {
        label: model.classes()[winner].clone(),
        scores: debug.then(|| {
            model
                .classes()
                .iter()
                .cloned()
                .zip(calibrated)
                .collect::<BTreeMap<_, _>>()
        }),
    }
}
