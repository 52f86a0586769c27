//! Conversion of `TreeModel` (binary-split classification trees).
//!
//! Only the `binarySplit` / `missingValueStrategy="defaultChild"` /
//! `noTrueChildStrategy="returnLastPrediction"` combination builds; any
//! other strategy is refused here, at load time, so evaluation never has
//! to improvise.

use std::collections::BTreeSet;

use roxmltree::Node;

use crate::data::ProcessedValue;
use crate::inference::Evaluator;
use crate::repr::{BoolOp, ComparisonOp, DecisionTree, NodeId, Predicate, SetOp};
use crate::vector::{FieldToValueEntry, InputForm, VectorRange, Vectorizer};

use super::dict::{DataDictionary, DerivedFields};
use super::fields::resolve;
use super::xml::{array_tokens, element_children, require_attr, require_child};
use super::{PmmlError, PmmlPipeline};

pub(super) fn build(
    node: Node<'_, '_>,
    data_dict: &DataDictionary,
    derived: &DerivedFields,
) -> Result<PmmlPipeline, PmmlError> {
    let function = require_attr(node, "functionName")?;
    if function != "classification" {
        return Err(PmmlError::Unsupported {
            construct: "TreeModel functionName",
            detail: format!("`{function}`"),
        });
    }
    check_strategy(node, "splitCharacteristic", "multiSplit", "binarySplit")?;
    check_strategy(node, "missingValueStrategy", "none", "defaultChild")?;
    check_strategy(
        node,
        "noTrueChildStrategy",
        "returnNullPrediction",
        "returnLastPrediction",
    )?;

    let root = require_child(node, "Node")?;
    let mut arrays = TreeArrays::default();
    walk(root, &mut arrays)?;

    let tree = DecisionTree::new(
        arrays.scores,
        arrays.is_leaf,
        arrays.left_children,
        arrays.right_children,
        arrays.left_predicates,
        arrays.right_predicates,
        arrays.default_children,
    );
    tree.validate()?;

    // One pass-through range per referenced field, keyed by the name the
    // predicates use.
    let mut fields = BTreeSet::new();
    for predicate in tree_predicates(&tree) {
        collect_fields(predicate, &mut fields);
    }
    let mut ranges = Vec::new();
    for field_name in fields {
        let resolved = resolve(&field_name, derived)?;
        data_dict.require(&resolved.raw_field)?;
        ranges.push(VectorRange::FieldToValue(FieldToValueEntry {
            key: field_name,
            field: resolved.raw_field,
            steps: resolved.steps,
        }));
    }

    Ok(PmmlPipeline {
        vectorizer: Vectorizer::new(ranges, InputForm::FieldMap),
        evaluator: Evaluator::DecisionTree(tree),
    })
}

fn check_strategy(
    node: Node<'_, '_>,
    attribute: &'static str,
    default: &'static str,
    supported: &'static str,
) -> Result<(), PmmlError> {
    let value = node.attribute(attribute).unwrap_or(default);
    if value != supported {
        return Err(PmmlError::Unsupported {
            construct: "tree strategy",
            detail: format!("{attribute}=`{value}`, only `{supported}` is supported"),
        });
    }
    Ok(())
}

#[derive(Default)]
struct TreeArrays {
    scores: Vec<String>,
    is_leaf: Vec<bool>,
    left_children: Vec<NodeId>,
    right_children: Vec<NodeId>,
    left_predicates: Vec<Predicate>,
    right_predicates: Vec<Predicate>,
    default_children: Vec<NodeId>,
}

/// Preorder walk assigning node ids; children parse their predicates at
/// the parent so the parent can wire predicate and child id together.
fn walk(node: Node<'_, '_>, arrays: &mut TreeArrays) -> Result<NodeId, PmmlError> {
    let my_id = arrays.scores.len() as NodeId;
    arrays.scores.push(require_attr(node, "score")?.to_owned());
    arrays.is_leaf.push(true);
    arrays.left_children.push(0);
    arrays.right_children.push(0);
    arrays.left_predicates.push(Predicate::True);
    arrays.right_predicates.push(Predicate::True);
    arrays.default_children.push(0);

    let children: Vec<Node> = element_children(node)
        .filter(|n| n.tag_name().name() == "Node")
        .collect();
    if children.is_empty() {
        return Ok(my_id);
    }
    if children.len() != 2 {
        return Err(PmmlError::Unsupported {
            construct: "tree node",
            detail: format!(
                "node `{}` has {} children, binary splits need exactly two",
                node.attribute("id").unwrap_or("?"),
                children.len()
            ),
        });
    }

    let left_predicate = node_predicate(children[0])?;
    let right_predicate = node_predicate(children[1])?;
    let left_id = walk(children[0], arrays)?;
    let right_id = walk(children[1], arrays)?;

    // defaultChild names a direct child by its id attribute.
    let default_ref = require_attr(node, "defaultChild")?;
    let default_id = if children[0].attribute("id") == Some(default_ref) {
        left_id
    } else if children[1].attribute("id") == Some(default_ref) {
        right_id
    } else {
        return Err(PmmlError::UnknownReference {
            element: "Node",
            kind: "default child",
            name: default_ref.to_owned(),
        });
    };

    let i = my_id as usize;
    arrays.is_leaf[i] = false;
    arrays.left_children[i] = left_id;
    arrays.right_children[i] = right_id;
    arrays.left_predicates[i] = left_predicate;
    arrays.right_predicates[i] = right_predicate;
    arrays.default_children[i] = default_id;
    Ok(my_id)
}

const PREDICATE_ELEMENTS: [&str; 5] = [
    "True",
    "False",
    "SimplePredicate",
    "SimpleSetPredicate",
    "CompoundPredicate",
];

/// The predicate guarding a child node: its first predicate element.
fn node_predicate(node: Node<'_, '_>) -> Result<Predicate, PmmlError> {
    let element = element_children(node)
        .find(|n| PREDICATE_ELEMENTS.contains(&n.tag_name().name()))
        .ok_or_else(|| PmmlError::MissingElement {
            element: "predicate",
            parent: format!("Node `{}`", node.attribute("id").unwrap_or("?")),
        })?;
    parse_predicate(element)
}

fn parse_predicate(node: Node<'_, '_>) -> Result<Predicate, PmmlError> {
    match node.tag_name().name() {
        "True" => Ok(Predicate::True),
        "False" => Ok(Predicate::False),
        "SimplePredicate" => {
            let field = require_attr(node, "field")?.to_owned();
            let op = match require_attr(node, "operator")? {
                "equal" => ComparisonOp::Equal,
                "notEqual" => ComparisonOp::NotEqual,
                "lessThan" => ComparisonOp::LessThan,
                "lessOrEqual" => ComparisonOp::LessOrEqual,
                "greaterThan" => ComparisonOp::GreaterThan,
                "greaterOrEqual" => ComparisonOp::GreaterOrEqual,
                other => {
                    return Err(PmmlError::Unsupported {
                        construct: "predicate operator",
                        detail: format!("`{other}` on field `{field}`"),
                    })
                }
            };
            let raw = require_attr(node, "value")?;
            let value = match raw.parse::<f64>() {
                Ok(x) => ProcessedValue::Num(x),
                Err(_) => ProcessedValue::Str(raw.to_owned()),
            };
            Ok(Predicate::Simple { field, op, value })
        }
        "SimpleSetPredicate" => {
            let field = require_attr(node, "field")?.to_owned();
            let op = match require_attr(node, "booleanOperator")? {
                "isIn" => SetOp::IsIn,
                "isNotIn" => SetOp::IsNotIn,
                other => {
                    return Err(PmmlError::Unsupported {
                        construct: "set predicate operator",
                        detail: format!("`{other}` on field `{field}`"),
                    })
                }
            };
            let array = require_child(node, "Array")?;
            let values: BTreeSet<String> = array_tokens(array).into_iter().collect();
            Ok(Predicate::SimpleSet { field, op, values })
        }
        "CompoundPredicate" => {
            let op = match require_attr(node, "booleanOperator")? {
                "and" => BoolOp::And,
                "or" => BoolOp::Or,
                other => {
                    return Err(PmmlError::Unsupported {
                        construct: "compound predicate operator",
                        detail: format!("`{other}`"),
                    })
                }
            };
            let terms = element_children(node)
                .filter(|n| PREDICATE_ELEMENTS.contains(&n.tag_name().name()))
                .map(parse_predicate)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::Compound { op, terms })
        }
        other => Err(PmmlError::Unsupported {
            construct: "predicate",
            detail: format!("<{other}>"),
        }),
    }
}

/// All predicates stored in a built tree.
fn tree_predicates(tree: &DecisionTree) -> impl Iterator<Item = &Predicate> {
    (0..tree.n_nodes() as NodeId).flat_map(move |n| {
        [tree.left_predicate(n), tree.right_predicate(n)].into_iter()
    })
}

fn collect_fields(predicate: &Predicate, out: &mut BTreeSet<String>) {
    match predicate {
        Predicate::True | Predicate::False => {}
        Predicate::Simple { field, .. } => {
            out.insert(field.clone());
        }
        Predicate::SimpleSet { field, .. } => {
            out.insert(field.clone());
        }
        Predicate::Compound { terms, .. } => {
            for term in terms {
                collect_fields(term, out);
            }
        }
    }
}
