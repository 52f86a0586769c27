//! Vectorization: preprocessing chains, slot ranges, and the model-input
//! evaluator.
//!
//! The pipeline through this module is:
//!
//! 1. a factory (PMML or JSON spec) builds an ordered [`VectorRange`] list,
//! 2. [`Vectorizer::convert`] runs each range against a
//!    [`DataSource`](crate::data::DataSource) for one record,
//! 3. the resulting [`ModelInput`] feeds an evaluator, or
//!    [`Vectorizer::vectorize`] returns the vector itself.

mod input;
pub mod preprocess;
pub mod range;
mod vectorizer;

pub use input::{FieldValueMap, ModelInput, SparseVector, VectorOutput};
pub use preprocess::{apply_chain, PreProcessingStep};
pub use range::{
    CategoricalEntries, ContinuousEntry, FieldToValueEntry, InterceptEntry, TermWeight,
    VectorRange,
};
pub use vectorizer::{InputForm, Vectorizer};

/// Errors while converting one record into a model input.
///
/// Once a model has built, conversion cannot fail on data shape - absent
/// fields are handled by the missing-value policy. What can fail is a
/// capability mismatch with the record source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error(
        "field `{field}` needs term statistics for frequency weighting, \
         but the data source provides none"
    )]
    TermStatsUnavailable { field: String },
}
