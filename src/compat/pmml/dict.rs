//! PMML data and transformation dictionaries.
//!
//! Structural parsing of `DataDictionary` (raw field declarations) and the
//! derived-field dictionaries (`TransformationDictionary` and per-model
//! `LocalTransformations`). Derived expressions are normalized into the
//! two recognized shapes; anything else is an unsupported construct,
//! reported with the offending field's name.

use std::collections::HashMap;

use roxmltree::Node;

use crate::data::FieldValue;

use super::xml::{element_children, find_child, require_attr, require_f64};
use super::PmmlError;

/// Declared kind of a raw field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Continuous,
    Categorical,
}

/// One `DataField` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub name: String,
    pub op_type: OpType,
    /// Declared category domain, in document order (may be empty).
    pub values: Vec<String>,
}

/// The `DataDictionary`: raw fields by name.
#[derive(Debug, Clone, Default)]
pub struct DataDictionary {
    fields: HashMap<String, DataField>,
}

impl DataDictionary {
    pub fn parse(node: Node<'_, '_>) -> Result<Self, PmmlError> {
        let mut fields = HashMap::new();
        for child in element_children(node) {
            if child.tag_name().name() != "DataField" {
                continue;
            }
            let name = require_attr(child, "name")?.to_owned();
            let op_type = match require_attr(child, "optype")? {
                "continuous" => OpType::Continuous,
                "categorical" => OpType::Categorical,
                other => {
                    return Err(PmmlError::Unsupported {
                        construct: "field optype",
                        detail: format!("`{other}` on field `{name}`"),
                    })
                }
            };
            let values = element_children(child)
                .filter(|n| n.tag_name().name() == "Value")
                .map(|n| require_attr(n, "value").map(str::to_owned))
                .collect::<Result<Vec<_>, _>>()?;
            fields.insert(
                name.clone(),
                DataField {
                    name,
                    op_type,
                    values,
                },
            );
        }
        Ok(Self { fields })
    }

    pub fn get(&self, name: &str) -> Option<&DataField> {
        self.fields.get(name)
    }

    /// The declared field, or an `UndefinedField` error.
    pub fn require(&self, name: &str) -> Result<&DataField, PmmlError> {
        self.get(name)
            .ok_or_else(|| PmmlError::UndefinedField(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A recognized derived-field expression.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedExpr {
    /// `if isMissing(source) then constant else source`.
    MissingSub {
        source: String,
        replacement: FieldValue,
    },
    /// `NormContinuous` with two `LinearNorm` anchor points, reduced to
    /// `x * factor + offset`.
    LinearNorm {
        source: String,
        factor: f64,
        offset: f64,
    },
}

impl DerivedExpr {
    /// The field this expression derives from.
    pub fn source(&self) -> &str {
        match self {
            DerivedExpr::MissingSub { source, .. } => source,
            DerivedExpr::LinearNorm { source, .. } => source,
        }
    }
}

/// Derived fields by name, merged from `TransformationDictionary` and the
/// model's `LocalTransformations`.
#[derive(Debug, Clone, Default)]
pub struct DerivedFields {
    map: HashMap<String, DerivedExpr>,
}

impl DerivedFields {
    /// Parse and merge one dictionary element into this set.
    pub fn merge(&mut self, node: Node<'_, '_>) -> Result<(), PmmlError> {
        for child in element_children(node) {
            if child.tag_name().name() != "DerivedField" {
                continue;
            }
            let name = require_attr(child, "name")?.to_owned();
            let expr = parse_derived_expr(child, &name)?;
            self.map.insert(name, expr);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DerivedExpr> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn parse_derived_expr(field: Node<'_, '_>, name: &str) -> Result<DerivedExpr, PmmlError> {
    let expr = element_children(field)
        .find(|n| !matches!(n.tag_name().name(), "Extension"))
        .ok_or(PmmlError::MissingElement {
            element: "expression",
            parent: format!("DerivedField `{name}`"),
        })?;

    match expr.tag_name().name() {
        "NormContinuous" => parse_norm_continuous(expr, name),
        "Apply" => parse_missing_substitution(expr, name),
        other => Err(PmmlError::Unsupported {
            construct: "derived field expression",
            detail: format!("<{other}> on field `{name}`"),
        }),
    }
}

fn parse_norm_continuous(node: Node<'_, '_>, name: &str) -> Result<DerivedExpr, PmmlError> {
    let source = require_attr(node, "field")?.to_owned();
    let anchors: Vec<_> = element_children(node)
        .filter(|n| n.tag_name().name() == "LinearNorm")
        .collect();
    if anchors.len() != 2 {
        return Err(PmmlError::Unsupported {
            construct: "NormContinuous",
            detail: format!(
                "field `{name}` declares {} LinearNorm points, only the two-point form is supported",
                anchors.len()
            ),
        });
    }

    let orig1 = require_f64(anchors[0], "orig")?;
    let norm1 = require_f64(anchors[0], "norm")?;
    let orig2 = require_f64(anchors[1], "orig")?;
    let norm2 = require_f64(anchors[1], "norm")?;
    if orig1 == orig2 {
        return Err(PmmlError::InvalidNumber {
            attribute: "orig",
            element: format!("LinearNorm of `{name}`"),
            value: format!("{orig1} twice"),
        });
    }
    let factor = (norm2 - norm1) / (orig2 - orig1);
    let offset = norm1 - orig1 * factor;
    Ok(DerivedExpr::LinearNorm {
        source,
        factor,
        offset,
    })
}

/// Recognize `Apply function="if"` wrapping `isMissing` - the only Apply
/// shape the engine supports.
fn parse_missing_substitution(node: Node<'_, '_>, name: &str) -> Result<DerivedExpr, PmmlError> {
    let function = require_attr(node, "function")?;
    if function != "if" {
        return Err(PmmlError::Unsupported {
            construct: "Apply function",
            detail: format!("`{function}` on field `{name}`"),
        });
    }

    let args: Vec<_> = element_children(node).collect();
    let condition = args.first().copied().ok_or(PmmlError::MissingElement {
        element: "Apply",
        parent: format!("Apply/if of `{name}`"),
    })?;
    if condition.tag_name().name() != "Apply"
        || condition.attribute("function") != Some("isMissing")
    {
        return Err(PmmlError::Unsupported {
            construct: "Apply condition",
            detail: format!(
                "field `{name}`: only `isMissing` conditions are supported"
            ),
        });
    }
    let source = require_attr(require_field_ref(condition)?, "field")?.to_owned();

    // The two branches are a Constant (replacement) and a FieldRef back to
    // the source, in either order.
    let constant = args[1..]
        .iter()
        .find(|n| n.tag_name().name() == "Constant")
        .ok_or(PmmlError::MissingElement {
            element: "Constant",
            parent: format!("Apply/if of `{name}`"),
        })?;

    let text = constant.text().unwrap_or_default().trim().to_owned();
    let replacement = match constant.attribute("dataType") {
        Some("string") => FieldValue::Str(text),
        _ => match text.parse::<f64>() {
            Ok(x) => FieldValue::Num(x),
            Err(_) => FieldValue::Str(text),
        },
    };

    Ok(DerivedExpr::MissingSub {
        source,
        replacement,
    })
}

fn require_field_ref<'a, 'd>(node: Node<'a, 'd>) -> Result<Node<'a, 'd>, PmmlError> {
    find_child(node, "FieldRef").ok_or(PmmlError::MissingElement {
        element: "FieldRef",
        parent: "Apply/isMissing".to_owned(),
    })
}
