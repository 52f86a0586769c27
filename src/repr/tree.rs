//! Decision tree representation (SoA) and structural validation.
//!
//! Binary-split trees only. Nodes live in flat parallel arrays indexed by
//! [`NodeId`]; each split node carries its two children, the predicate
//! guarding each child, and the declared default child for missing values.
//! Every node carries a score label so the no-true-child policy
//! (`returnLastPrediction`) always has something to return.

// Allow many constructor arguments for creating trees with all their fields.
#![allow(clippy::too_many_arguments)]

use std::collections::BTreeSet;

use crate::data::ProcessedValue;

/// Node index local to one tree (0 = root).
pub type NodeId = u32;

/// Three-valued predicate outcome: `None` is PMML's UNKNOWN, produced when
/// a referenced field value is missing.
pub type PredicateOutcome = Option<bool>;

/// Comparison operator of a simple predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

/// Set-membership operator of a simple set predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    IsIn,
    IsNotIn,
}

/// Boolean connective of a compound predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// A node predicate, evaluated against the processed field-value map.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    /// Single-field comparison. Equality compares the literal value;
    /// ordering operators compare numerically.
    Simple {
        field: String,
        op: ComparisonOp,
        value: ProcessedValue,
    },
    /// Set membership over string categories.
    SimpleSet {
        field: String,
        op: SetOp,
        values: BTreeSet<String>,
    },
    Compound {
        op: BoolOp,
        terms: Vec<Predicate>,
    },
}

impl Predicate {
    /// Evaluate against one record's field map.
    ///
    /// A multi-valued field satisfies a positive predicate if any of its
    /// values does. A field whose value set is exactly `{Missing}` makes
    /// the predicate UNKNOWN; compound predicates propagate UNKNOWN with
    /// PMML's three-valued truth tables.
    pub fn evaluate(&self, map: &crate::vector::FieldValueMap) -> PredicateOutcome {
        match self {
            Predicate::True => Some(true),
            Predicate::False => Some(false),
            Predicate::Simple { field, op, value } => {
                let values = present_values(map, field)?;
                Some(values.iter().any(|&v| compare(v, *op, value)))
            }
            Predicate::SimpleSet { field, op, values } => {
                let present = present_values(map, field)?;
                let hit = present
                    .iter()
                    .any(|v| values.contains(&v.to_string()));
                Some(match op {
                    SetOp::IsIn => hit,
                    SetOp::IsNotIn => !hit,
                })
            }
            Predicate::Compound { op, terms } => {
                let mut unknown = false;
                for term in terms {
                    match (op, term.evaluate(map)) {
                        (BoolOp::And, Some(false)) => return Some(false),
                        (BoolOp::Or, Some(true)) => return Some(true),
                        (_, None) => unknown = true,
                        (_, Some(_)) => {}
                    }
                }
                if unknown {
                    None
                } else {
                    Some(matches!(op, BoolOp::And))
                }
            }
        }
    }
}

/// Non-missing values of a field, or `None` when the field is missing.
fn present_values<'a>(
    map: &'a crate::vector::FieldValueMap,
    field: &str,
) -> Option<Vec<&'a ProcessedValue>> {
    let set = map.get(field)?;
    let present: Vec<_> = set.iter().filter(|v| !v.is_missing()).collect();
    if present.is_empty() {
        None
    } else {
        Some(present)
    }
}

fn compare(lhs: &ProcessedValue, op: ComparisonOp, rhs: &ProcessedValue) -> bool {
    match op {
        ComparisonOp::Equal => values_equal(lhs, rhs),
        ComparisonOp::NotEqual => !values_equal(lhs, rhs),
        ComparisonOp::LessThan
        | ComparisonOp::LessOrEqual
        | ComparisonOp::GreaterThan
        | ComparisonOp::GreaterOrEqual => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => match op {
                ComparisonOp::LessThan => a < b,
                ComparisonOp::LessOrEqual => a <= b,
                ComparisonOp::GreaterThan => a > b,
                ComparisonOp::GreaterOrEqual => a >= b,
                _ => unreachable!(),
            },
            _ => false,
        },
    }
}

/// Equality that tolerates numeric values surfacing as strings.
fn values_equal(lhs: &ProcessedValue, rhs: &ProcessedValue) -> bool {
    if lhs == rhs {
        return true;
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => lhs.as_str().zip(rhs.as_str()).map_or(false, |(a, b)| a == b),
    }
}

// ============================================================================
// DecisionTree
// ============================================================================

/// Structural validation errors for [`DecisionTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    EmptyTree,
    #[error("node {node}: {side} child {child} is out of bounds ({n_nodes} nodes)")]
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    #[error("node {node} references itself as a child")]
    SelfLoop { node: NodeId },
    #[error("node {node} is reachable by more than one path")]
    DuplicateVisit { node: NodeId },
    #[error("cycle detected at node {node}")]
    CycleDetected { node: NodeId },
    #[error("node {node} is unreachable from the root")]
    UnreachableNode { node: NodeId },
    #[error("node {node}: default child {child} is not one of its children")]
    DefaultChildNotAChild { node: NodeId, child: NodeId },
}

/// Structure-of-arrays storage for one binary decision tree.
///
/// Child indices are local to this tree (0 = root). All arrays have one
/// entry per node; child/predicate/default entries of leaf nodes are
/// never read.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    scores: Box<[String]>,
    is_leaf: Box<[bool]>,
    left_children: Box<[NodeId]>,
    right_children: Box<[NodeId]>,
    left_predicates: Box<[Predicate]>,
    right_predicates: Box<[Predicate]>,
    default_children: Box<[NodeId]>,
}

impl DecisionTree {
    /// Create a tree from parallel arrays.
    ///
    /// All arrays must have the same length (number of nodes).
    pub fn new(
        scores: Vec<String>,
        is_leaf: Vec<bool>,
        left_children: Vec<NodeId>,
        right_children: Vec<NodeId>,
        left_predicates: Vec<Predicate>,
        right_predicates: Vec<Predicate>,
        default_children: Vec<NodeId>,
    ) -> Self {
        let n_nodes = scores.len();
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, left_predicates.len());
        debug_assert_eq!(n_nodes, right_predicates.len());
        debug_assert_eq!(n_nodes, default_children.len());

        Self {
            scores: scores.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            left_predicates: left_predicates.into_boxed_slice(),
            right_predicates: right_predicates.into_boxed_slice(),
            default_children: default_children.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn score(&self, node: NodeId) -> &str {
        &self.scores[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn left_predicate(&self, node: NodeId) -> &Predicate {
        &self.left_predicates[node as usize]
    }

    #[inline]
    pub fn right_predicate(&self, node: NodeId) -> &Predicate {
        &self.right_predicates[node as usize]
    }

    #[inline]
    pub fn default_child(&self, node: NodeId) -> NodeId {
        self.default_children[node as usize]
    }

    /// Validate basic structural invariants for this tree.
    ///
    /// Runs at model build time; a tree that fails here never reaches
    /// evaluation.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        // Iterative DFS with color marking.
        // 0 = unvisited, 1 = visiting, 2 = done
        let mut color = vec![0u8; n_nodes];
        let mut stack: Vec<(NodeId, u8)> = vec![(0, 0)];

        while let Some((node, phase)) = stack.pop() {
            let node_usize = node as usize;

            match phase {
                0 => {
                    match color[node_usize] {
                        0 => {}
                        1 => return Err(TreeValidationError::CycleDetected { node }),
                        2 => return Err(TreeValidationError::DuplicateVisit { node }),
                        _ => unreachable!(),
                    }

                    color[node_usize] = 1;
                    stack.push((node, 1));

                    if !self.is_leaf(node) {
                        let left = self.left_child(node);
                        let right = self.right_child(node);

                        if left == node || right == node {
                            return Err(TreeValidationError::SelfLoop { node });
                        }
                        if (left as usize) >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side: "left",
                                child: left,
                                n_nodes,
                            });
                        }
                        if (right as usize) >= n_nodes {
                            return Err(TreeValidationError::ChildOutOfBounds {
                                node,
                                side: "right",
                                child: right,
                                n_nodes,
                            });
                        }

                        let default = self.default_child(node);
                        if default != left && default != right {
                            return Err(TreeValidationError::DefaultChildNotAChild {
                                node,
                                child: default,
                            });
                        }

                        stack.push((right, 0));
                        stack.push((left, 0));
                    }
                }
                1 => {
                    color[node_usize] = 2;
                }
                _ => unreachable!(),
            }
        }

        for (i, &c) in color.iter().enumerate() {
            if c == 0 {
                return Err(TreeValidationError::UnreachableNode { node: i as u32 });
            }
        }

        Ok(())
    }
}
