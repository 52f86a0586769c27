//! The field-value provider boundary.
//!
//! A [`DataSource`] is the engine's only view of one record: a bag of named
//! fields, each holding zero or more raw values. The host engine (a search
//! index, a document store, a test fixture) implements it; the core never
//! performs I/O of its own and treats every call as synchronous.

use std::collections::{HashMap, HashSet};

use super::FieldValue;

/// Per-term statistics, used only by the `tf`/`tf_idf`/`bm25` feature kinds.
///
/// The numbers mirror what a search engine's term vectors expose: how often
/// the term occurs in this record's field, in how many documents of the
/// corpus it occurs, and the field-length statistics BM25 normalizes by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    /// Occurrences of the term in this record's field.
    pub term_freq: f64,
    /// Number of documents in the corpus containing the term.
    pub doc_freq: f64,
    /// Total number of documents in the corpus.
    pub doc_count: f64,
    /// Number of terms in this record's field.
    pub field_length: f64,
    /// Mean field length across the corpus.
    pub avg_field_length: f64,
}

/// Read-only access to one record's field values.
///
/// Implementations may block internally (posting-list lookups and the like);
/// from the core's perspective every call completes synchronously.
pub trait DataSource {
    /// All raw values of `field` in this record.
    ///
    /// An absent field yields an empty vector; that is not an error, the
    /// missing-value policy of the consuming range decides what it means.
    /// Value order is irrelevant to the engine except that multi-valued
    /// categorical fields set one vector slot per occurring known category.
    fn values(&self, field: &str) -> Vec<FieldValue>;

    /// Term statistics for one term of `field`.
    ///
    /// `None` means the backing store keeps no term vectors for the field.
    /// A term that simply does not occur in this record should instead
    /// return stats with `term_freq == 0.0`.
    fn term_stats(&self, _field: &str, _term: &str) -> Option<TermStats> {
        None
    }
}

/// In-memory [`DataSource`] over plain maps.
///
/// The embedding-and-test implementation: field values plus optional
/// per-field term statistics.
#[derive(Debug, Clone, Default)]
pub struct MapDataSource {
    fields: HashMap<String, Vec<FieldValue>>,
    term_stats: HashMap<(String, String), TermStats>,
    /// Fields that carry term vectors; lookups of absent terms on these
    /// yield zero-frequency stats instead of `None`.
    term_fields: HashSet<String>,
}

impl MapDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values of a field, replacing any previous ones.
    pub fn with_field<V: Into<FieldValue>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.fields.insert(
            field.to_owned(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Attach term statistics for `(field, term)`.
    pub fn with_term_stats(mut self, field: &str, term: &str, stats: TermStats) -> Self {
        self.term_fields.insert(field.to_owned());
        self.term_stats
            .insert((field.to_owned(), term.to_owned()), stats);
        self
    }

    /// Tokenize `text` on whitespace and store both the distinct terms as
    /// field values and per-term `term_freq` counts.
    ///
    /// Corpus-level numbers (`doc_freq`, `doc_count`, `avg_field_length`)
    /// default to a single-document corpus; override per term with
    /// [`with_term_stats`](Self::with_term_stats) when a test needs them.
    pub fn with_text(mut self, field: &str, text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let field_length = tokens.len() as f64;
        self.term_fields.insert(field.to_owned());

        let mut counts: HashMap<&str, f64> = HashMap::new();
        for token in &tokens {
            *counts.entry(token).or_insert(0.0) += 1.0;
        }

        let mut terms: Vec<&str> = counts.keys().copied().collect();
        terms.sort_unstable();
        self.fields.insert(
            field.to_owned(),
            terms.iter().map(|t| FieldValue::from(*t)).collect(),
        );

        for (term, tf) in counts {
            self.term_stats.insert(
                (field.to_owned(), term.to_owned()),
                TermStats {
                    term_freq: tf,
                    doc_freq: 1.0,
                    doc_count: 1.0,
                    field_length,
                    avg_field_length: field_length,
                },
            );
        }
        self
    }
}

impl DataSource for MapDataSource {
    fn values(&self, field: &str) -> Vec<FieldValue> {
        self.fields.get(field).cloned().unwrap_or_default()
    }

    fn term_stats(&self, field: &str, term: &str) -> Option<TermStats> {
        let key = (field.to_owned(), term.to_owned());
        match self.term_stats.get(&key) {
            Some(stats) => Some(*stats),
            // Term vectors exist for the field but the term is absent.
            None if self.term_fields.contains(field) => Some(TermStats {
                term_freq: 0.0,
                doc_freq: 0.0,
                doc_count: 1.0,
                field_length: self.fields.get(field).map_or(0.0, |v| v.len() as f64),
                avg_field_length: 1.0,
            }),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_field_is_empty_not_error() {
        let source = MapDataSource::new();
        assert!(source.values("nope").is_empty());
        assert!(source.term_stats("nope", "fox").is_none());
    }

    #[test]
    fn with_text_counts_terms() {
        let source = MapDataSource::new().with_text("body", "the quick brown fox is quick");

        let values = source.values("body");
        assert_eq!(values.len(), 5); // distinct terms

        let quick = source.term_stats("body", "quick").unwrap();
        assert_eq!(quick.term_freq, 2.0);
        assert_eq!(quick.field_length, 6.0);

        let the = source.term_stats("body", "the").unwrap();
        assert_eq!(the.term_freq, 1.0);
    }

    #[test]
    fn absent_term_with_term_vectors_scores_zero_tf() {
        let source = MapDataSource::new().with_text("body", "the quick brown fox");
        let zonk = source.term_stats("body", "zonk").unwrap();
        assert_eq!(zonk.term_freq, 0.0);
    }
}
