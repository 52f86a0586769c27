//! Vector slot ranges.
//!
//! A [`VectorRange`] owns one or more named slots of the feature vector and
//! knows how to turn raw field values into `(index, value)` entries for
//! them. The set is closed: construction, `size()`, and entry extraction
//! all match exhaustively, so an unhandled variant is a compile error
//! rather than a runtime surprise.

use std::collections::BTreeSet;

use crate::data::{DataSource, ProcessedValue, TermStats};

use super::preprocess::{apply_chain, PreProcessingStep};
use super::ConvertError;

/// BM25 constants, matching the host engine's defaults.
const BM25_K1: f64 = 1.2;
const BM25_B: f64 = 0.75;

/// How a categorical slot's value is computed from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermWeight {
    /// 1.0 when the category occurs at all.
    #[default]
    Occurrence,
    /// Raw term frequency.
    Tf,
    /// Classic tf·idf: `tf * (ln((doc_count + 1) / (doc_freq + 1)) + 1)`.
    TfIdf,
    /// Lucene-style BM25 with `k1 = 1.2`, `b = 0.75`.
    Bm25,
}

impl TermWeight {
    /// Whether this weighting needs [`DataSource::term_stats`].
    pub fn needs_term_stats(self) -> bool {
        !matches!(self, TermWeight::Occurrence)
    }

    fn value(self, stats: &TermStats) -> f64 {
        match self {
            TermWeight::Occurrence => 1.0,
            TermWeight::Tf => stats.term_freq,
            TermWeight::TfIdf => {
                let idf = ((stats.doc_count + 1.0) / (stats.doc_freq + 1.0)).ln() + 1.0;
                stats.term_freq * idf
            }
            TermWeight::Bm25 => {
                let idf = (1.0
                    + (stats.doc_count - stats.doc_freq + 0.5) / (stats.doc_freq + 0.5))
                    .ln();
                let len_norm = 1.0 - BM25_B
                    + BM25_B * stats.field_length / stats.avg_field_length.max(f64::MIN_POSITIVE);
                let tf_norm =
                    stats.term_freq * (BM25_K1 + 1.0) / (stats.term_freq + BM25_K1 * len_norm);
                idf * tf_norm
            }
        }
    }
}

/// Single continuous slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousEntry {
    pub field: String,
    pub offset: usize,
    pub steps: Vec<PreProcessingStep>,
}

/// One slot per known category of a field, in the order the model's own
/// parameter table declared the categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalEntries {
    pub field: String,
    pub offset: usize,
    pub categories: Vec<String>,
    pub weight: TermWeight,
    pub steps: Vec<PreProcessingStep>,
}

/// Constant 1.0 slot for intercept parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptEntry {
    pub offset: usize,
}

/// No slots: passes the set of processed values through, keyed by the
/// model-input field name. Used by the map-consuming evaluators.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldToValueEntry {
    /// Key under which the values appear in the field map (the name the
    /// model's predicates and input tables use).
    pub key: String,
    /// Raw field the values are read from.
    pub field: String,
    pub steps: Vec<PreProcessingStep>,
}

/// A contiguous claim on vector slots, or a pass-through of raw values.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorRange {
    Continuous(ContinuousEntry),
    Categorical(CategoricalEntries),
    Intercept(InterceptEntry),
    FieldToValue(FieldToValueEntry),
}

impl VectorRange {
    /// Number of vector slots this range reserves.
    pub fn size(&self) -> usize {
        match self {
            VectorRange::Continuous(_) | VectorRange::Intercept(_) => 1,
            VectorRange::Categorical(c) => c.categories.len(),
            VectorRange::FieldToValue(_) => 0,
        }
    }

    /// First slot index, for slot-owning ranges.
    pub fn offset(&self) -> Option<usize> {
        match self {
            VectorRange::Continuous(c) => Some(c.offset),
            VectorRange::Categorical(c) => Some(c.offset),
            VectorRange::Intercept(i) => Some(i.offset),
            VectorRange::FieldToValue(_) => None,
        }
    }

    /// The raw field this range reads, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            VectorRange::Continuous(c) => Some(&c.field),
            VectorRange::Categorical(c) => Some(&c.field),
            VectorRange::FieldToValue(f) => Some(&f.field),
            VectorRange::Intercept(_) => None,
        }
    }

    /// Append this range's `(index, value)` entries for one record.
    ///
    /// Only meaningful for slot-owning ranges; a `FieldToValue` range
    /// contributes nothing to a numeric vector.
    pub fn append_entries(
        &self,
        source: &dyn DataSource,
        out: &mut Vec<(usize, f64)>,
    ) -> Result<(), ConvertError> {
        match self {
            VectorRange::Intercept(i) => {
                out.push((i.offset, 1.0));
                Ok(())
            }
            VectorRange::Continuous(c) => {
                let raw = source.values(&c.field).into_iter().next();
                if let Some(value) = apply_chain(&c.steps, raw) {
                    if let Some(x) = value.as_f64() {
                        if x.is_finite() {
                            out.push((c.offset, x));
                        }
                    }
                }
                Ok(())
            }
            VectorRange::Categorical(c) => c.append_categorical(source, out),
            VectorRange::FieldToValue(_) => Ok(()),
        }
    }

    /// Processed value set for one record, for map-consuming models.
    ///
    /// Absent or empty input yields exactly `{Missing}` (after the chain
    /// had its chance to substitute).
    pub fn processed_values(&self, source: &dyn DataSource) -> BTreeSet<ProcessedValue> {
        let (field, steps) = match self {
            VectorRange::FieldToValue(f) => (&f.field, &f.steps),
            VectorRange::Continuous(c) => (&c.field, &c.steps),
            VectorRange::Categorical(c) => (&c.field, &c.steps),
            VectorRange::Intercept(_) => return BTreeSet::new(),
        };

        let raw = source.values(field);
        let mut values = BTreeSet::new();
        if raw.is_empty() {
            match apply_chain(steps, None) {
                Some(v) => values.insert(ProcessedValue::from(v)),
                None => values.insert(ProcessedValue::Missing),
            };
        } else {
            for value in raw {
                match apply_chain(steps, Some(value)) {
                    Some(v) => values.insert(ProcessedValue::from(v)),
                    None => values.insert(ProcessedValue::Missing),
                };
            }
        }
        values
    }
}

impl CategoricalEntries {
    fn append_categorical(
        &self,
        source: &dyn DataSource,
        out: &mut Vec<(usize, f64)>,
    ) -> Result<(), ConvertError> {
        if self.weight.needs_term_stats() {
            // Frequency-weighted slots read the term vectors directly, one
            // lookup per known category.
            for (i, term) in self.categories.iter().enumerate() {
                let stats = source.term_stats(&self.field, term).ok_or_else(|| {
                    ConvertError::TermStatsUnavailable {
                        field: self.field.clone(),
                    }
                })?;
                if stats.term_freq > 0.0 {
                    out.push((self.offset + i, self.weight.value(&stats)));
                }
            }
            return Ok(());
        }

        // Occurrence weighting only needs field-value membership. Every
        // occurring known category sets its slot; first write wins so a
        // repeated raw value cannot claim a slot twice.
        let mut seen = vec![false; self.categories.len()];
        for raw in source.values(&self.field) {
            let Some(value) = apply_chain(&self.steps, Some(raw)) else {
                continue;
            };
            let term = value.to_string();
            if let Some(i) = self.categories.iter().position(|c| *c == term) {
                if !seen[i] {
                    seen[i] = true;
                    out.push((self.offset + i, 1.0));
                }
            }
        }
        Ok(())
    }
}
