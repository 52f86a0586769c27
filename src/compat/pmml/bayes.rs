//! Conversion of `NaiveBayesModel` (mixed Gaussian / pair-count inputs).

use std::collections::HashMap;

use roxmltree::Node;

use crate::inference::Evaluator;
use crate::repr::{
    BayesInput, BayesInputKind, DiscreteCounts, GaussianParams, NaiveBayesModel,
};
use crate::vector::{FieldToValueEntry, InputForm, VectorRange, Vectorizer};

use super::dict::{DataDictionary, DerivedFields};
use super::fields::resolve;
use super::xml::{element_children, require_attr, require_child, require_f64};
use super::{PmmlError, PmmlPipeline};

pub(super) fn build(
    node: Node<'_, '_>,
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<PmmlPipeline, PmmlError> {
    let function = require_attr(node, "functionName")?;
    if function != "classification" {
        return Err(PmmlError::Unsupported {
            construct: "NaiveBayesModel functionName",
            detail: format!("`{function}`"),
        });
    }
    let threshold = require_f64(node, "threshold")?;

    // Class labels and priors come from the BayesOutput counts; each
    // TargetValueCount carries its own label.
    let output = require_child(node, "BayesOutput")?;
    let output_counts = require_child(output, "TargetValueCounts")?;
    let mut classes: Vec<String> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for count in element_children(output_counts).filter(|n| n.tag_name().name() == "TargetValueCount")
    {
        classes.push(require_attr(count, "value")?.to_owned());
        counts.push(require_f64(count, "count")?);
    }
    if classes.len() < 2 {
        return Err(PmmlError::Unsupported {
            construct: "BayesOutput",
            detail: format!("{} target classes, need at least two", classes.len()),
        });
    }
    let total: f64 = counts.iter().sum();
    let log_priors: Vec<f64> = counts
        .iter()
        .map(|c| (c / total).max(f64::MIN_POSITIVE).ln())
        .collect();

    // Inputs in declared order; each builds one scoring entry per class
    // and one pass-through range keyed by the input's field name.
    let inputs_node = require_child(node, "BayesInputs")?;
    let mut inputs: Vec<BayesInput> = Vec::new();
    let mut ranges: Vec<VectorRange> = Vec::new();
    for input_node in element_children(inputs_node).filter(|n| n.tag_name().name() == "BayesInput") {
        let field_name = require_attr(input_node, "fieldName")?.to_owned();
        let resolved = resolve(&field_name, derived)?;
        data_dict.require(&resolved.raw_field)?;

        let kind = parse_input_kind(input_node, &field_name, &classes)?;

        // Continuous inputs keep their full chain (substitution becomes
        // the imputed numeric value); categorical inputs drop substitution
        // so absence reaches the floor probability instead of a stand-in
        // category.
        let steps = match kind {
            BayesInputKind::Continuous(_) => resolved.steps.clone(),
            BayesInputKind::Categorical(_) => resolved.without_substitution(),
        };
        ranges.push(VectorRange::FieldToValue(FieldToValueEntry {
            key: field_name.clone(),
            field: resolved.raw_field.clone(),
            steps,
        }));
        inputs.push(BayesInput {
            field: field_name,
            kind,
        });
    }
    if inputs.is_empty() {
        return Err(PmmlError::MissingElement {
            element: "BayesInput",
            parent: "BayesInputs".to_owned(),
        });
    }

    let vectorizer = Vectorizer::new(ranges, InputForm::FieldMap);
    let model = NaiveBayesModel::new(classes, log_priors, inputs, threshold);

    Ok(PmmlPipeline {
        vectorizer,
        evaluator: Evaluator::NaiveBayes(model),
    })
}

fn parse_input_kind(
    input_node: Node<'_, '_>,
    field_name: &str,
    classes: &[String],
) -> Result<BayesInputKind, PmmlError> {
    let mut gaussians: HashMap<String, GaussianParams> = HashMap::new();
    let mut pair_counts: Vec<(String, HashMap<String, f64>)> = Vec::new();

    for child in element_children(input_node) {
        match child.tag_name().name() {
            "TargetValueStats" => {
                for stat in
                    element_children(child).filter(|n| n.tag_name().name() == "TargetValueStat")
                {
                    let class = require_attr(stat, "value")?.to_owned();
                    let distribution = element_children(stat).next().ok_or_else(|| {
                        PmmlError::MissingElement {
                            element: "GaussianDistribution",
                            parent: format!("TargetValueStat of `{field_name}`"),
                        }
                    })?;
                    if distribution.tag_name().name() != "GaussianDistribution" {
                        return Err(PmmlError::Unsupported {
                            construct: "Bayes distribution",
                            detail: format!(
                                "<{}> on field `{field_name}`, only Gaussian continuous \
                                 statistics are supported",
                                distribution.tag_name().name()
                            ),
                        });
                    }
                    gaussians.insert(
                        class,
                        GaussianParams {
                            mean: require_f64(distribution, "mean")?,
                            variance: require_f64(distribution, "variance")?,
                        },
                    );
                }
            }
            "PairCounts" => {
                let category = require_attr(child, "value")?.to_owned();
                let counts_node = require_child(child, "TargetValueCounts")?;
                let mut per_class = HashMap::new();
                for count in element_children(counts_node)
                    .filter(|n| n.tag_name().name() == "TargetValueCount")
                {
                    per_class.insert(
                        require_attr(count, "value")?.to_owned(),
                        require_f64(count, "count")?,
                    );
                }
                pair_counts.push((category, per_class));
            }
            "Extension" => {}
            other => {
                return Err(PmmlError::Unsupported {
                    construct: "BayesInput entry",
                    detail: format!("<{other}> on field `{field_name}`"),
                })
            }
        }
    }

    match (gaussians.is_empty(), pair_counts.is_empty()) {
        (false, true) => {
            let per_class = classes
                .iter()
                .map(|class| {
                    gaussians
                        .get(class)
                        .copied()
                        .ok_or_else(|| PmmlError::UnknownReference {
                            element: "TargetValueStats",
                            kind: "class statistic for",
                            name: format!("{field_name}/{class}"),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BayesInputKind::Continuous(per_class))
        }
        (true, false) => {
            // Pivot category → class counts into per-class category counts.
            let per_class = classes
                .iter()
                .map(|class| {
                    let counts: HashMap<String, f64> = pair_counts
                        .iter()
                        .map(|(category, by_class)| {
                            (category.clone(), by_class.get(class).copied().unwrap_or(0.0))
                        })
                        .collect();
                    DiscreteCounts::new(counts)
                })
                .collect();
            Ok(BayesInputKind::Categorical(per_class))
        }
        (true, true) => Err(PmmlError::MissingElement {
            element: "TargetValueStats",
            parent: format!("BayesInput `{field_name}`"),
        }),
        (false, false) => Err(PmmlError::Unsupported {
            construct: "BayesInput",
            detail: format!(
                "field `{field_name}` mixes continuous statistics and pair counts"
            ),
        }),
    }
}
