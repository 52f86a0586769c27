//! scorers: a declarative vectorization and model scoring library.
//!
//! Given a model description in PMML or a JSON "vector spec", and a
//! source of raw field values for one record, this crate builds a
//! deterministic pipeline that traces model inputs back through declared
//! transformations, maps values into fixed feature-vector slots, and
//! evaluates regression, naive Bayes, or decision tree models.
//!
//! # Key Types
//!
//! - [`ScoringModel`] - classification pipeline loaded from PMML
//! - [`DocumentVectorizer`] - plain vectorization from a JSON spec
//! - [`DataSource`] - the boundary trait record providers implement
//! - [`ClassPrediction`] / [`VectorOutput`] - evaluation results
//!
//! # Loading PMML Models
//!
//! Use [`ScoringModel::from_pmml`]. Only an enumerated PMML subset is
//! supported; anything else is refused at load time with an error naming
//! the construct. See the [`compat::pmml`] module for the boundary.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod compat;
pub mod data;
pub mod inference;
pub mod model;
pub mod repr;
pub mod spec;
pub mod utils;
pub mod vector;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level pipeline types
pub use model::{DocumentVectorizer, ScoringModel};

// The record boundary
pub use data::{DataSource, FieldValue, MapDataSource, ProcessedValue, TermStats};

// Evaluation results
pub use inference::{ClassPrediction, Evaluator};
pub use vector::{ModelInput, SparseVector, VectorOutput};

// Spec and PMML entry points
pub use compat::pmml::PmmlError;
pub use spec::{FeatureSpec, SpecError, VectorSpec};

// Shared utilities
pub use utils::Parallelism;
