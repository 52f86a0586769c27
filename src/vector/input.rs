//! Model input and vector output types.
//!
//! A [`ModelInput`] is built fresh for every evaluated record and discarded
//! afterwards; the model side of the pipeline is immutable and shared.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::ProcessedValue;

/// Sparse numeric vector: parallel indices/values plus the total length.
///
/// Invariants: indices strictly increasing, each index written at most
/// once, every index below `length`. Violations are builder defects and
/// are caught by `debug_assert!` in [`SparseVector::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub length: usize,
}

impl SparseVector {
    pub fn new(indices: Vec<usize>, values: Vec<f64>, length: usize) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        debug_assert!(
            indices.windows(2).all(|w| w[0] < w[1]),
            "sparse indices must be strictly increasing: {indices:?}"
        );
        debug_assert!(indices.last().map_or(true, |&i| i < length));
        Self {
            indices,
            values,
            length,
        }
    }

    /// Iterate `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Expand into a dense vector of `length` values.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.length];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }
}

/// Processed values per model-input field name.
///
/// `BTreeMap`/`BTreeSet` keep iteration deterministic, which the naive
/// Bayes evaluator relies on for multi-valued fields.
pub type FieldValueMap = BTreeMap<String, BTreeSet<ProcessedValue>>;

/// A complete model input for one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelInput {
    /// Sparse feature vector, consumed by the linear evaluators.
    Vector(SparseVector),
    /// Field-name → processed-value-set map, consumed by naive Bayes and
    /// decision trees.
    FieldMap(FieldValueMap),
}

impl ModelInput {
    /// The sparse vector, when this input carries one.
    pub fn as_vector(&self) -> Option<&SparseVector> {
        match self {
            ModelInput::Vector(v) => Some(v),
            ModelInput::FieldMap(_) => None,
        }
    }

    /// The field map, when this input carries one.
    pub fn as_field_map(&self) -> Option<&FieldValueMap> {
        match self {
            ModelInput::FieldMap(m) => Some(m),
            ModelInput::Vector(_) => None,
        }
    }
}

/// Result of plain vectorization (the JSON vector-spec path).
///
/// Serializes to the wire shape `{"values": [...], "indices": [...]?,
/// "length": n}`; the dense form omits `indices`.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorOutput {
    Dense(Vec<f64>),
    Sparse(SparseVector),
}

impl VectorOutput {
    pub fn length(&self) -> usize {
        match self {
            VectorOutput::Dense(values) => values.len(),
            VectorOutput::Sparse(v) => v.length,
        }
    }

    /// Dense view regardless of representation.
    pub fn to_dense(&self) -> Vec<f64> {
        match self {
            VectorOutput::Dense(values) => values.clone(),
            VectorOutput::Sparse(v) => v.to_dense(),
        }
    }

    /// Nonzero `(index, value)` pairs regardless of representation.
    pub fn nonzero(&self) -> Vec<(usize, f64)> {
        match self {
            VectorOutput::Dense(values) => values
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, v)| v != 0.0)
                .collect(),
            VectorOutput::Sparse(v) => v.iter().filter(|&(_, v)| v != 0.0).collect(),
        }
    }
}

impl Serialize for VectorOutput {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        match self {
            VectorOutput::Dense(values) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("values", values)?;
                map.serialize_entry("length", &values.len())?;
                map.end()
            }
            VectorOutput::Sparse(v) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("values", &v.values)?;
                map.serialize_entry("indices", &v.indices)?;
                map.serialize_entry("length", &v.length)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_to_dense_round_trip() {
        let sparse = SparseVector::new(vec![0, 2], vec![1.5, 3.0], 4);
        assert_eq!(sparse.to_dense(), vec![1.5, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn nonzero_agrees_between_forms() {
        let sparse = VectorOutput::Sparse(SparseVector::new(vec![1, 3], vec![2.0, 4.0], 5));
        let dense = VectorOutput::Dense(vec![0.0, 2.0, 0.0, 4.0, 0.0]);
        assert_eq!(sparse.nonzero(), dense.nonzero());
    }

    #[test]
    fn serializes_wire_shape() {
        let out = VectorOutput::Sparse(SparseVector::new(vec![0, 2], vec![1.0, 1.0], 4));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["indices"], serde_json::json!([0, 2]));
        assert_eq!(json["length"], serde_json::json!(4));

        let dense = VectorOutput::Dense(vec![1.0, 2.0]);
        let json = serde_json::to_value(&dense).unwrap();
        assert!(json.get("indices").is_none());
        assert_eq!(json["values"], serde_json::json!([1.0, 2.0]));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "strictly increasing")]
    fn duplicate_index_is_a_builder_defect() {
        SparseVector::new(vec![1, 1], vec![1.0, 2.0], 3);
    }
}
