//! Preprocessing steps applied to raw values before vectorization.
//!
//! A chain of steps reproduces, at evaluation time, the derivations a model
//! declared at training time. The chain is stored root-to-target: the step
//! nearest the raw field runs first, so applying the whole chain to a raw
//! value yields the value the model was trained on.

use crate::data::FieldValue;

/// One declared value transform.
#[derive(Debug, Clone, PartialEq)]
pub enum PreProcessingStep {
    /// Replace an absent value with a constant.
    MissingValueSubstitution { replacement: FieldValue },
    /// Affine re-normalization `x * factor + offset`, derived from a pair
    /// of `LinearNorm` anchor points.
    LinearNormalization { factor: f64, offset: f64 },
}

impl PreProcessingStep {
    /// Build a linear normalization from two anchor points
    /// `(orig1, norm1)`, `(orig2, norm2)`.
    ///
    /// Returns `None` when the orig points coincide (the line is
    /// undefined); callers report that as malformed input.
    pub fn linear_norm_from_points(orig1: f64, norm1: f64, orig2: f64, norm2: f64) -> Option<Self> {
        if orig1 == orig2 {
            return None;
        }
        let factor = (norm2 - norm1) / (orig2 - orig1);
        let offset = norm1 - orig1 * factor;
        Some(PreProcessingStep::LinearNormalization { factor, offset })
    }

    /// Apply this step to one possibly-absent value.
    pub fn apply(&self, value: Option<FieldValue>) -> Option<FieldValue> {
        match self {
            PreProcessingStep::MissingValueSubstitution { replacement } => {
                value.or_else(|| Some(replacement.clone()))
            }
            PreProcessingStep::LinearNormalization { factor, offset } => value.map(|v| {
                match v.as_f64() {
                    Some(x) => FieldValue::Num(x * factor + offset),
                    // Non-numeric values pass through untouched; the data
                    // dictionary only attaches normalization to continuous
                    // fields, so this arm is a lenient escape hatch for
                    // stores that hand numbers back as text.
                    None => v,
                }
            }),
        }
    }
}

/// Apply a whole chain, first step first.
pub fn apply_chain(steps: &[PreProcessingStep], value: Option<FieldValue>) -> Option<FieldValue> {
    steps.iter().fold(value, |acc, step| step.apply(acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_fills_missing_only() {
        let step = PreProcessingStep::MissingValueSubstitution {
            replacement: FieldValue::Num(0.5),
        };
        assert_eq!(step.apply(None), Some(FieldValue::Num(0.5)));
        assert_eq!(
            step.apply(Some(FieldValue::Num(2.0))),
            Some(FieldValue::Num(2.0))
        );
    }

    #[test]
    fn linear_norm_from_points_matches_anchors() {
        // Maps [0, 10] onto [0, 1].
        let step = PreProcessingStep::linear_norm_from_points(0.0, 0.0, 10.0, 1.0).unwrap();
        assert_eq!(step.apply(Some(FieldValue::Num(0.0))), Some(FieldValue::Num(0.0)));
        assert_eq!(step.apply(Some(FieldValue::Num(10.0))), Some(FieldValue::Num(1.0)));
        assert_eq!(step.apply(Some(FieldValue::Num(5.0))), Some(FieldValue::Num(0.5)));
    }

    #[test]
    fn linear_norm_rejects_coincident_points() {
        assert!(PreProcessingStep::linear_norm_from_points(1.0, 0.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn linear_norm_keeps_missing_missing() {
        let step = PreProcessingStep::linear_norm_from_points(0.0, 1.0, 1.0, 3.0).unwrap();
        assert_eq!(step.apply(None), None);
    }

    #[test]
    fn chain_runs_root_first() {
        // Substitute 4.0 when missing, then normalize x -> x / 2.
        let chain = vec![
            PreProcessingStep::MissingValueSubstitution {
                replacement: FieldValue::Num(4.0),
            },
            PreProcessingStep::linear_norm_from_points(0.0, 0.0, 2.0, 1.0).unwrap(),
        ];
        assert_eq!(apply_chain(&chain, None), Some(FieldValue::Num(2.0)));
        assert_eq!(
            apply_chain(&chain, Some(FieldValue::Num(6.0))),
            Some(FieldValue::Num(3.0))
        );
    }
}
