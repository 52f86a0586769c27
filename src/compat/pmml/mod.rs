//! PMML model format support.
//!
//! Parses the PMML 4.x subset this engine evaluates and converts it into a
//! native (vectorizer, evaluator) pair. The supported surface is an
//! enumerated boundary, not an approximation: a document using any other
//! model type, expression, predicate kind, or strategy is refused at load
//! time with an error naming the construct.
//!
//! Supported:
//! - `DataDictionary`, `TransformationDictionary` / `LocalTransformations`
//!   with `NormContinuous` (two-point) and `Apply function="if"` over
//!   `isMissing` derived fields,
//! - `RegressionModel`: binary two-table classification, `logit` or no
//!   normalization,
//! - `GeneralRegressionModel`: `multinomialLogistic` classification,
//! - `NaiveBayesModel`: Gaussian and pair-count inputs,
//! - `TreeModel`: `binarySplit`, `missingValueStrategy="defaultChild"`,
//!   `noTrueChildStrategy="returnLastPrediction"`.

mod bayes;
mod dict;
mod fields;
mod general;
mod regression;
mod tree;
mod xml;

pub use dict::{DataDictionary, DataField, DerivedExpr, DerivedFields, OpType};
pub use fields::{resolve, ResolvedField};

use crate::inference::Evaluator;
use crate::repr::TreeValidationError;
use crate::vector::Vectorizer;

use xml::{element_children, find_child, require_child};

/// Error type for PMML parsing and conversion.
#[derive(Debug, thiserror::Error)]
pub enum PmmlError {
    #[error("invalid PMML XML: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("document root is <{0}>, expected <PMML>")]
    NotPmml(String),
    #[error("no supported model element found in the document")]
    NoModel,
    #[error("missing element <{element}> under <{parent}>")]
    MissingElement {
        element: &'static str,
        parent: String,
    },
    #[error("missing attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        attribute: &'static str,
        element: String,
    },
    #[error("invalid number `{value}` in attribute `{attribute}` on <{element}>")]
    InvalidNumber {
        attribute: &'static str,
        element: String,
        value: String,
    },
    #[error("unsupported {construct}: {detail}")]
    Unsupported {
        construct: &'static str,
        detail: String,
    },
    #[error("field `{0}` is not declared in the data dictionary")]
    UndefinedField(String),
    #[error("<{element}> references unknown {kind} `{name}`")]
    UnknownReference {
        element: &'static str,
        kind: &'static str,
        name: String,
    },
    #[error("derivation chain starting at `{0}` is cyclic")]
    CyclicDerivation(String),
    #[error("tree structure invalid: {0}")]
    InvalidTree(#[from] TreeValidationError),
}

/// A model pipeline converted from PMML: the vectorizer and the evaluator
/// built from the same parameter tables, so slot order matches by
/// construction.
#[derive(Debug, Clone)]
pub struct PmmlPipeline {
    pub vectorizer: Vectorizer,
    pub evaluator: Evaluator,
}

/// Parse a PMML document and convert its single model.
pub fn parse(xml_text: &str) -> Result<PmmlPipeline, PmmlError> {
    let doc = roxmltree::Document::parse(xml_text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "PMML" {
        return Err(PmmlError::NotPmml(root.tag_name().name().to_owned()));
    }

    let data_dict = DataDictionary::parse(require_child(root, "DataDictionary")?)?;

    let mut derived = DerivedFields::default();
    if let Some(dict) = find_child(root, "TransformationDictionary") {
        derived.merge(dict)?;
    }

    for child in element_children(root) {
        let name = child.tag_name().name();
        match name {
            "Header" | "MiningBuildTask" | "DataDictionary" | "TransformationDictionary"
            | "Extension" => continue,
            _ => {}
        }

        // The model element. Fold its local transformations into the
        // derivation dictionary before the factory resolves fields.
        if let Some(local) = find_child(child, "LocalTransformations") {
            derived.merge(local)?;
        }

        let pipeline = match name {
            "RegressionModel" => regression::build(child, &data_dict, &derived)?,
            "GeneralRegressionModel" => general::build(child, &data_dict, &derived)?,
            "NaiveBayesModel" => bayes::build(child, &data_dict, &derived)?,
            "TreeModel" => tree::build(child, &data_dict, &derived)?,
            other => {
                return Err(PmmlError::Unsupported {
                    construct: "model type",
                    detail: format!("<{other}>"),
                })
            }
        };

        log::debug!(
            "loaded PMML <{}>: {} vector slots, {} ranges",
            name,
            pipeline.vectorizer.length(),
            pipeline.vectorizer.ranges().len()
        );
        return Ok(pipeline);
    }

    Err(PmmlError::NoModel)
}
