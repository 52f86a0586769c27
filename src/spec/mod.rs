//! JSON vector spec: plain vectorization without a model.
//!
//! The spec is a small foreign format,
//!
//! ```json
//! {
//!   "sparse": true,
//!   "features": [
//!     {"field": "text", "type": "terms",
//!      "terms": ["fox", "quick"], "number": "tf"}
//!   ]
//! }
//! ```
//!
//! parsed into foreign serde types and then built into a native
//! [`Vectorizer`]. Feature slot offsets are assigned in array order.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, OneOrMany};

use crate::vector::{
    CategoricalEntries, InputForm, TermWeight, VectorRange, Vectorizer,
};

/// Errors while parsing or building a vector spec.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid vector spec JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {index} (`{field}`): unsupported feature type `{kind}`")]
    UnsupportedFeatureType {
        index: usize,
        field: String,
        kind: String,
    },
    #[error("feature {index} (`{field}`) declares no terms")]
    EmptyTerms { index: usize, field: String },
}

/// How a term slot's numeric value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureNumber {
    #[default]
    Occurrence,
    Tf,
    TfIdf,
    Bm25,
}

impl From<FeatureNumber> for TermWeight {
    fn from(number: FeatureNumber) -> Self {
        match number {
            FeatureNumber::Occurrence => TermWeight::Occurrence,
            FeatureNumber::Tf => TermWeight::Tf,
            FeatureNumber::TfIdf => TermWeight::TfIdf,
            FeatureNumber::Bm25 => TermWeight::Bm25,
        }
    }
}

/// One feature block of the spec.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Record field the terms are read from.
    #[builder(into)]
    pub field: String,
    /// Feature kind; only `terms` is implemented.
    #[serde(rename = "type", default = "default_feature_type")]
    #[builder(into, default = default_feature_type())]
    pub kind: String,
    /// Known terms, one vector slot each, in declared order.
    /// Accepts a bare string for single-term features.
    #[serde_as(as = "OneOrMany<_>")]
    pub terms: Vec<String>,
    /// Slot value computation.
    #[serde(default)]
    #[builder(default)]
    pub number: FeatureNumber,
}

fn default_feature_type() -> String {
    "terms".to_owned()
}

/// A complete vector spec.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct VectorSpec {
    /// Emit a sparse `(indices, values)` vector instead of a dense one.
    #[serde(default)]
    #[builder(default)]
    pub sparse: bool,
    pub features: Vec<FeatureSpec>,
}

impl VectorSpec {
    /// Parse a spec from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the native vectorizer, assigning slot offsets in array order.
    pub fn build(&self) -> Result<Vectorizer, SpecError> {
        let mut ranges = Vec::with_capacity(self.features.len());
        let mut offset = 0;

        for (index, feature) in self.features.iter().enumerate() {
            if feature.kind != "terms" {
                return Err(SpecError::UnsupportedFeatureType {
                    index,
                    field: feature.field.clone(),
                    kind: feature.kind.clone(),
                });
            }
            if feature.terms.is_empty() {
                return Err(SpecError::EmptyTerms {
                    index,
                    field: feature.field.clone(),
                });
            }

            ranges.push(VectorRange::Categorical(CategoricalEntries {
                field: feature.field.clone(),
                offset,
                categories: feature.terms.clone(),
                weight: feature.number.into(),
                steps: vec![],
            }));
            offset += feature.terms.len();
        }

        let form = if self.sparse {
            InputForm::Sparse
        } else {
            InputForm::Dense
        };
        log::debug!(
            "built vectorizer from spec: {} features, {} slots, sparse={}",
            self.features.len(),
            offset,
            self.sparse
        );
        Ok(Vectorizer::new(ranges, form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MapDataSource;

    #[test]
    fn parses_full_spec() {
        let spec = VectorSpec::from_json(
            r#"{
                "sparse": true,
                "features": [
                    {"field": "text", "type": "terms",
                     "terms": ["fox", "quick"], "number": "tf"}
                ]
            }"#,
        )
        .unwrap();

        assert!(spec.sparse);
        assert_eq!(spec.features.len(), 1);
        assert_eq!(spec.features[0].number, FeatureNumber::Tf);
        assert_eq!(spec.features[0].terms, vec!["fox", "quick"]);
    }

    #[test]
    fn single_term_may_be_a_bare_string() {
        let spec = VectorSpec::from_json(
            r#"{"features": [{"field": "text", "terms": "fox"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.features[0].terms, vec!["fox"]);
        assert_eq!(spec.features[0].number, FeatureNumber::Occurrence);
        assert!(!spec.sparse);
    }

    #[test]
    fn offsets_follow_array_order() {
        let spec = VectorSpec::builder()
            .features(vec![
                FeatureSpec::builder()
                    .field("a")
                    .terms(vec!["x".into(), "y".into()])
                    .build(),
                FeatureSpec::builder()
                    .field("b")
                    .terms(vec!["z".into()])
                    .build(),
            ])
            .build();

        let vectorizer = spec.build().unwrap();
        assert_eq!(vectorizer.length(), 3);
        assert_eq!(vectorizer.ranges()[1].offset(), Some(2));
    }

    #[test]
    fn unsupported_feature_type_is_refused() {
        let spec = VectorSpec::from_json(
            r#"{"features": [{"field": "f", "type": "shingles", "terms": ["x"]}]}"#,
        )
        .unwrap();
        let err = spec.build().unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedFeatureType { ref kind, .. } if kind == "shingles"));
    }

    #[test]
    fn empty_terms_are_refused() {
        let spec = VectorSpec::from_json(r#"{"features": [{"field": "f", "terms": []}]}"#).unwrap();
        assert!(matches!(
            spec.build().unwrap_err(),
            SpecError::EmptyTerms { .. }
        ));
    }

    #[test]
    fn occurrence_spec_end_to_end() {
        let spec = VectorSpec::from_json(
            r#"{
                "sparse": true,
                "features": [
                    {"field": "text", "terms": ["fox", "quick", "the", "zonk"],
                     "number": "occurrence"}
                ]
            }"#,
        )
        .unwrap();
        let vectorizer = spec.build().unwrap();

        let source = MapDataSource::new().with_field("text", ["the", "quick", "fox"]);
        let out = vectorizer.vectorize(&source).unwrap();
        match out {
            crate::vector::VectorOutput::Sparse(v) => {
                assert_eq!(v.indices, vec![0, 1, 2]);
                assert_eq!(v.values, vec![1.0, 1.0, 1.0]);
                assert_eq!(v.length, 4);
            }
            other => panic!("expected sparse output, got {other:?}"),
        }
    }
}
