//! Immutable native model representations.
//!
//! Everything here is built once by a factory in [`crate::compat`], then
//! shared read-only across arbitrarily many concurrent evaluations.

pub mod bayes;
pub mod linear;
pub mod tree;

pub use bayes::{BayesInput, BayesInputKind, DiscreteCounts, GaussianParams, NaiveBayesModel};
pub use linear::{GeneralizedLinearModel, LinkFunction};
pub use tree::{
    BoolOp, ComparisonOp, DecisionTree, NodeId, Predicate, SetOp, TreeValidationError,
};
