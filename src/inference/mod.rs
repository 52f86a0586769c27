//! Per-record evaluation of the native model representations.
//!
//! Each evaluator consumes the [`ModelInput`](crate::vector::ModelInput)
//! form its vectorizer produces: the linear family reads the sparse
//! vector, naive Bayes and the decision tree read the field map. All
//! evaluation is pure and synchronous; the shared model is never mutated.

mod bayes;
mod linear;
mod tree;

pub use bayes::evaluate_naive_bayes;
pub use linear::evaluate_linear;
pub use tree::evaluate_tree;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::repr::{DecisionTree, GeneralizedLinearModel, NaiveBayesModel};
use crate::vector::ModelInput;

/// The model side of a pipeline: one closed variant per supported family.
///
/// Construction, input form, and evaluation all match exhaustively, so a
/// new family extends the enum or does not compile.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluator {
    GeneralizedLinear(GeneralizedLinearModel),
    NaiveBayes(NaiveBayesModel),
    DecisionTree(DecisionTree),
}

impl Evaluator {
    /// Evaluate one converted record.
    ///
    /// # Panics
    ///
    /// Panics when fed the wrong [`ModelInput`] form. The factory that
    /// built this evaluator also built its vectorizer, so a mismatch is an
    /// internal defect, not caller input.
    pub fn evaluate(&self, input: &ModelInput, debug: bool) -> ClassPrediction {
        match self {
            Evaluator::GeneralizedLinear(model) => {
                let vector = input
                    .as_vector()
                    .expect("linear evaluator fed a field map");
                evaluate_linear(model, vector, debug)
            }
            Evaluator::NaiveBayes(model) => {
                let map = input
                    .as_field_map()
                    .expect("naive Bayes evaluator fed a vector");
                evaluate_naive_bayes(model, map, debug)
            }
            Evaluator::DecisionTree(tree) => {
                let map = input
                    .as_field_map()
                    .expect("tree evaluator fed a vector");
                evaluate_tree(tree, map, debug)
            }
        }
    }
}

/// A classification result.
///
/// `scores` is populated in debug mode: class label → score (calibrated
/// probability for the linear family, accumulated log-score for naive
/// Bayes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPrediction {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f64>>,
}

impl ClassPrediction {
    pub fn label_only(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scores: None,
        }
    }
}
