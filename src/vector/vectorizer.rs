//! The model-input evaluator.
//!
//! A [`Vectorizer`] owns an ordered list of [`VectorRange`]s and converts
//! one record into the [`ModelInput`] the downstream model consumes.

use crate::data::DataSource;

use super::input::{FieldValueMap, ModelInput, SparseVector, VectorOutput};
use super::range::VectorRange;
use super::ConvertError;

/// What the downstream consumer expects from `convert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputForm {
    /// Sparse `(index, value)` vector (linear models, sparse spec output).
    Sparse,
    /// Dense vector (dense spec output).
    Dense,
    /// Field-name → processed-value-set map (naive Bayes, decision tree).
    FieldMap,
}

/// Ordered ranges plus the total vector length.
///
/// Built once per model, immutable afterwards, freely shared across
/// threads. Slot disjointness between ranges is a construction-time
/// invariant; [`Vectorizer::new`] asserts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorizer {
    ranges: Vec<VectorRange>,
    length: usize,
    form: InputForm,
}

impl Vectorizer {
    /// Assemble a vectorizer from ranges built by a model factory.
    ///
    /// # Panics
    ///
    /// Debug-asserts that slot-owning ranges claim disjoint, contiguous
    /// stretches; overlap means the factory assigned the same index twice,
    /// which would silently corrupt scores.
    pub fn new(ranges: Vec<VectorRange>, form: InputForm) -> Self {
        let length = ranges.iter().map(VectorRange::size).sum();

        #[cfg(debug_assertions)]
        {
            let mut claimed = vec![false; length];
            for range in &ranges {
                if let Some(offset) = range.offset() {
                    for slot in offset..offset + range.size() {
                        debug_assert!(
                            !claimed[slot],
                            "vector slot {slot} claimed by more than one range"
                        );
                        claimed[slot] = true;
                    }
                }
            }
        }

        Self {
            ranges,
            length,
            form,
        }
    }

    /// Total number of vector slots.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn form(&self) -> InputForm {
        self.form
    }

    pub fn ranges(&self) -> &[VectorRange] {
        &self.ranges
    }

    /// Convert one record into a model input.
    pub fn convert(&self, source: &dyn DataSource) -> Result<ModelInput, ConvertError> {
        match self.form {
            InputForm::FieldMap => Ok(ModelInput::FieldMap(self.convert_map(source))),
            InputForm::Sparse | InputForm::Dense => {
                Ok(ModelInput::Vector(self.convert_sparse(source)?))
            }
        }
    }

    /// Convert one record into a standalone vector output.
    pub fn vectorize(&self, source: &dyn DataSource) -> Result<VectorOutput, ConvertError> {
        let sparse = self.convert_sparse(source)?;
        Ok(match self.form {
            InputForm::Dense => VectorOutput::Dense(sparse.to_dense()),
            _ => VectorOutput::Sparse(sparse),
        })
    }

    fn convert_sparse(&self, source: &dyn DataSource) -> Result<SparseVector, ConvertError> {
        let mut entries: Vec<(usize, f64)> = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            range.append_entries(source, &mut entries)?;
        }
        entries.sort_unstable_by_key(|&(i, _)| i);
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 != w[1].0),
            "two ranges emitted the same vector index"
        );

        let (indices, values) = entries.into_iter().unzip();
        Ok(SparseVector::new(indices, values, self.length))
    }

    fn convert_map(&self, source: &dyn DataSource) -> FieldValueMap {
        let mut map = FieldValueMap::new();
        for range in &self.ranges {
            if let VectorRange::FieldToValue(entry) = range {
                map.insert(entry.key.clone(), range.processed_values(source));
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MapDataSource, ProcessedValue};
    use crate::vector::range::{
        CategoricalEntries, ContinuousEntry, FieldToValueEntry, InterceptEntry, TermWeight,
    };

    fn sample_ranges() -> Vec<VectorRange> {
        vec![
            VectorRange::Continuous(ContinuousEntry {
                field: "age".into(),
                offset: 0,
                steps: vec![],
            }),
            VectorRange::Categorical(CategoricalEntries {
                field: "color".into(),
                offset: 1,
                categories: vec!["red".into(), "green".into()],
                weight: TermWeight::Occurrence,
                steps: vec![],
            }),
            VectorRange::Intercept(InterceptEntry { offset: 3 }),
        ]
    }

    #[test]
    fn convert_produces_sorted_sparse_vector() {
        let vectorizer = Vectorizer::new(sample_ranges(), InputForm::Sparse);
        assert_eq!(vectorizer.length(), 4);

        let source = MapDataSource::new()
            .with_field("age", [30.0])
            .with_field("color", ["green"]);

        let input = vectorizer.convert(&source).unwrap();
        let vector = input.as_vector().unwrap();
        assert_eq!(vector.indices, vec![0, 2, 3]);
        assert_eq!(vector.values, vec![30.0, 1.0, 1.0]);
        assert_eq!(vector.length, 4);
    }

    #[test]
    fn convert_is_deterministic() {
        let vectorizer = Vectorizer::new(sample_ranges(), InputForm::Sparse);
        let source = MapDataSource::new()
            .with_field("age", [30.0])
            .with_field("color", ["red", "green"]);

        let a = vectorizer.convert(&source).unwrap();
        let b = vectorizer.convert(&source).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dense_and_sparse_agree_on_nonzero_entries() {
        let sparse = Vectorizer::new(sample_ranges(), InputForm::Sparse);
        let dense = Vectorizer::new(sample_ranges(), InputForm::Dense);

        let source = MapDataSource::new().with_field("color", ["red"]);

        let s = sparse.vectorize(&source).unwrap();
        let d = dense.vectorize(&source).unwrap();
        assert_eq!(s.nonzero(), d.nonzero());
        assert_eq!(d.to_dense().len(), 4);
    }

    #[test]
    fn field_map_conversion_inserts_missing_sentinel() {
        let ranges = vec![VectorRange::FieldToValue(FieldToValueEntry {
            key: "color".into(),
            field: "color".into(),
            steps: vec![],
        })];
        let vectorizer = Vectorizer::new(ranges, InputForm::FieldMap);

        let input = vectorizer.convert(&MapDataSource::new()).unwrap();
        let map = input.as_field_map().unwrap();
        assert!(map["color"].contains(&ProcessedValue::Missing));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "claimed by more than one range")]
    fn overlapping_ranges_are_a_builder_defect() {
        let ranges = vec![
            VectorRange::Intercept(InterceptEntry { offset: 0 }),
            VectorRange::Continuous(ContinuousEntry {
                field: "x".into(),
                offset: 0,
                steps: vec![],
            }),
        ];
        Vectorizer::new(ranges, InputForm::Sparse);
    }
}
