//! High-level pipeline types.
//!
//! This module provides the user-facing wrappers that combine loading,
//! vectorization, and evaluation into a cohesive API:
//!
//! - [`ScoringModel`]: a classification pipeline loaded from PMML
//! - [`DocumentVectorizer`]: plain vectorization from a JSON vector spec
//!
//! Both are built once and shared read-only; each record evaluation is a
//! pure, synchronous computation over a caller-supplied
//! [`DataSource`](crate::data::DataSource).
//!
//! # Example
//!
//! ```ignore
//! use scorers::model::ScoringModel;
//! use scorers::data::MapDataSource;
//!
//! let model = ScoringModel::from_pmml(&pmml_xml)?;
//! let record = MapDataSource::new().with_field("age", [41.0]);
//! let prediction = model.evaluate(&record)?;
//! println!("{}", prediction.label);
//! ```

use crate::compat::pmml::{self, PmmlError};
use crate::data::DataSource;
use crate::inference::{ClassPrediction, Evaluator};
use crate::spec::{SpecError, VectorSpec};
use crate::utils::Parallelism;
use crate::vector::{ConvertError, VectorOutput, Vectorizer};

/// A classification pipeline: vectorizer and evaluator built from the
/// same PMML parameter tables.
#[derive(Debug, Clone)]
pub struct ScoringModel {
    vectorizer: Vectorizer,
    evaluator: Evaluator,
}

impl ScoringModel {
    /// Load a model from a PMML document.
    ///
    /// Build failures are fatal for the model: unsupported constructs and
    /// malformed documents are reported here and no partial pipeline is
    /// ever returned.
    pub fn from_pmml(xml: &str) -> Result<Self, PmmlError> {
        let pipeline = pmml::parse(xml)?;
        Ok(Self {
            vectorizer: pipeline.vectorizer,
            evaluator: pipeline.evaluator,
        })
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Evaluate one record.
    pub fn evaluate(&self, source: &dyn DataSource) -> Result<ClassPrediction, ConvertError> {
        let input = self.vectorizer.convert(source)?;
        Ok(self.evaluator.evaluate(&input, false))
    }

    /// Evaluate one record, returning per-class scores alongside the label.
    pub fn evaluate_debug(&self, source: &dyn DataSource) -> Result<ClassPrediction, ConvertError> {
        let input = self.vectorizer.convert(source)?;
        Ok(self.evaluator.evaluate(&input, true))
    }

    /// Evaluate many records, optionally fanning out with rayon.
    ///
    /// The model is shared read-only; records are independent, so the
    /// result order matches the input order in both modes.
    pub fn evaluate_batch<S: DataSource + Sync>(
        &self,
        sources: &[S],
        parallelism: Parallelism,
    ) -> Vec<Result<ClassPrediction, ConvertError>> {
        parallelism.maybe_par_map(0..sources.len(), |i| self.evaluate(&sources[i]))
    }
}

/// A plain vectorization pipeline built from a JSON vector spec.
#[derive(Debug, Clone)]
pub struct DocumentVectorizer {
    vectorizer: Vectorizer,
}

impl DocumentVectorizer {
    /// Build from the JSON form of a vector spec.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Self::from_spec(&VectorSpec::from_json(json)?)
    }

    /// Build from an already-parsed spec.
    pub fn from_spec(spec: &VectorSpec) -> Result<Self, SpecError> {
        Ok(Self {
            vectorizer: spec.build()?,
        })
    }

    pub fn length(&self) -> usize {
        self.vectorizer.length()
    }

    /// Vectorize one record.
    pub fn vectorize(&self, source: &dyn DataSource) -> Result<VectorOutput, ConvertError> {
        self.vectorizer.vectorize(source)
    }
}
