//! Field resolution: model input name → raw field + transform chain.

use std::collections::HashSet;

use crate::vector::PreProcessingStep;

use super::dict::{DerivedExpr, DerivedFields};
use super::PmmlError;

/// Result of tracing a model input back to its raw field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// The underlying raw field the chain starts from.
    pub raw_field: String,
    /// Transform chain in application order (nearest the raw field first).
    pub steps: Vec<PreProcessingStep>,
}

impl ResolvedField {
    /// The chain with any missing-value substitutions removed.
    ///
    /// Naive Bayes categorical inputs score absence through the model's
    /// own floor probability instead of substituting a stand-in category.
    pub fn without_substitution(&self) -> Vec<PreProcessingStep> {
        self.steps
            .iter()
            .filter(|s| !matches!(s, PreProcessingStep::MissingValueSubstitution { .. }))
            .cloned()
            .collect()
    }
}

/// Walk the derived-field dictionary backward from `target` until a name
/// no derivation matches - that name is the raw field.
///
/// The returned chain is ordered root-to-target, so applying it front to
/// back reproduces the declared derivation. A dictionary whose chain
/// revisits a name is rejected rather than looped on.
pub fn resolve(target: &str, derived: &DerivedFields) -> Result<ResolvedField, PmmlError> {
    let mut steps = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = target.to_owned();

    while let Some(expr) = derived.get(&current) {
        if !visited.insert(current.clone()) {
            return Err(PmmlError::CyclicDerivation(target.to_owned()));
        }
        match expr {
            DerivedExpr::MissingSub {
                source,
                replacement,
            } => {
                steps.push(PreProcessingStep::MissingValueSubstitution {
                    replacement: replacement.clone(),
                });
                current = source.clone();
            }
            DerivedExpr::LinearNorm {
                source,
                factor,
                offset,
            } => {
                steps.push(PreProcessingStep::LinearNormalization {
                    factor: *factor,
                    offset: *offset,
                });
                current = source.clone();
            }
        }
    }

    steps.reverse();
    Ok(ResolvedField {
        raw_field: current,
        steps,
    })
}
