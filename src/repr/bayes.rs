//! Naive Bayes model representation.
//!
//! One scoring function per (input field, class) pair, built once from the
//! model's per-class parameters: a Gaussian log-likelihood for continuous
//! fields, a floored discrete probability for categorical fields.

use std::collections::HashMap;

use crate::data::ProcessedValue;

/// Gaussian parameters for one (continuous field, class) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    pub mean: f64,
    pub variance: f64,
}

impl GaussianParams {
    /// Log of the normal density at `x`.
    pub fn log_likelihood(&self, x: f64) -> f64 {
        let variance = self.variance.max(f64::MIN_POSITIVE);
        let diff = x - self.mean;
        -0.5 * (2.0 * std::f64::consts::PI * variance).ln() - diff * diff / (2.0 * variance)
    }
}

/// Category counts for one (categorical field, class) pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscreteCounts {
    counts: HashMap<String, f64>,
    total: f64,
}

impl DiscreteCounts {
    pub fn new(counts: HashMap<String, f64>) -> Self {
        let total = counts.values().sum();
        Self { counts, total }
    }

    /// Probability of `category`, floored at `threshold` so unseen
    /// categories never zero out a class.
    pub fn probability(&self, category: &str, threshold: f64) -> f64 {
        if self.total <= 0.0 {
            return threshold;
        }
        let p = self.counts.get(category).copied().unwrap_or(0.0) / self.total;
        p.max(threshold)
    }
}

/// Per-class scoring data for one input field.
#[derive(Debug, Clone, PartialEq)]
pub enum BayesInputKind {
    /// Gaussian per class, indexed by class position.
    Continuous(Vec<GaussianParams>),
    /// Category counts per class, indexed by class position.
    Categorical(Vec<DiscreteCounts>),
}

/// One Bayes input field: where to read the value and how to score it.
#[derive(Debug, Clone, PartialEq)]
pub struct BayesInput {
    /// Model-input field name; key into the converted field map.
    pub field: String,
    pub kind: BayesInputKind,
}

impl BayesInput {
    /// Log-likelihood contribution of `value` for `class`.
    ///
    /// Never fails: a missing categorical value scores the floor
    /// probability, a missing continuous value contributes nothing.
    pub fn log_likelihood(&self, value: &ProcessedValue, class: usize, threshold: f64) -> f64 {
        match &self.kind {
            BayesInputKind::Continuous(per_class) => match value.as_f64() {
                Some(x) => per_class[class].log_likelihood(x),
                None => 0.0,
            },
            BayesInputKind::Categorical(per_class) => {
                let p = match value {
                    ProcessedValue::Missing => threshold,
                    other => per_class[class].probability(&other.to_string(), threshold),
                };
                p.ln()
            }
        }
    }
}

/// Immutable naive Bayes model: class priors plus per-field scoring data.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayesModel {
    classes: Vec<String>,
    log_priors: Vec<f64>,
    inputs: Vec<BayesInput>,
    threshold: f64,
}

impl NaiveBayesModel {
    /// Create a model from its parts.
    ///
    /// # Panics
    ///
    /// Asserts every input carries one scoring entry per class; a
    /// mismatch is a factory defect.
    pub fn new(
        classes: Vec<String>,
        log_priors: Vec<f64>,
        inputs: Vec<BayesInput>,
        threshold: f64,
    ) -> Self {
        assert_eq!(
            classes.len(),
            log_priors.len(),
            "classes ({}) don't match priors ({})",
            classes.len(),
            log_priors.len()
        );
        for input in &inputs {
            let per_class = match &input.kind {
                BayesInputKind::Continuous(v) => v.len(),
                BayesInputKind::Categorical(v) => v.len(),
            };
            assert_eq!(
                per_class,
                classes.len(),
                "input `{}` scores {} classes, model has {}",
                input.field,
                per_class,
                classes.len()
            );
        }
        Self {
            classes,
            log_priors,
            inputs,
            threshold,
        }
    }

    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[inline]
    pub fn log_prior(&self, class: usize) -> f64 {
        self.log_priors[class]
    }

    #[inline]
    pub fn inputs(&self) -> &[BayesInput] {
        &self.inputs
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
