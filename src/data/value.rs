//! Raw and processed field value types.
//!
//! A [`FieldValue`] is what a [`DataSource`](super::DataSource) hands out for
//! one field of one record. A [`ProcessedValue`] is what remains after a
//! preprocessing chain ran: either a concrete value or the explicit
//! [`ProcessedValue::Missing`] marker that the map-consuming evaluators
//! (naive Bayes, decision tree) score through their missing-value policy.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A raw value read from a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Numeric value (PMML declares doubles).
    Num(f64),
    /// Categorical / textual value.
    Str(String),
}

impl FieldValue {
    /// Numeric view of this value.
    ///
    /// Strings are parsed leniently because many field stores return
    /// numerics as text; `None` means the value has no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Num(x) => Some(*x),
            FieldValue::Str(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// String view of this value, if it is categorical.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Num(_) => None,
            FieldValue::Str(s) => Some(s.as_str()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Num(x)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Num(x) => write!(f, "{x}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

/// A field value after its preprocessing chain ran.
///
/// `Missing` is a first-class variant rather than a sentinel string, so
/// every consumer has to say what it does about absence.
///
/// `Eq`/`Ord`/`Hash` are implemented over the f64 bit pattern (via
/// `total_cmp`) so processed values can live in `BTreeSet`s with
/// deterministic iteration order; equality follows the same comparison to
/// keep the set invariants sound. NaN never enters a processed value;
/// conversion drops non-finite numbers before this point.
#[derive(Debug, Clone)]
pub enum ProcessedValue {
    Missing,
    Num(f64),
    Str(String),
}

impl ProcessedValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, ProcessedValue::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ProcessedValue::Num(x) => Some(*x),
            ProcessedValue::Str(s) => s.trim().parse::<f64>().ok(),
            ProcessedValue::Missing => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ProcessedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<FieldValue> for ProcessedValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Num(x) => ProcessedValue::Num(x),
            FieldValue::Str(s) => ProcessedValue::Str(s),
        }
    }
}

impl PartialEq for ProcessedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ProcessedValue {}

impl Ord for ProcessedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use ProcessedValue::*;
        match (self, other) {
            (Missing, Missing) => Ordering::Equal,
            (Missing, _) => Ordering::Less,
            (_, Missing) => Ordering::Greater,
            (Num(a), Num(b)) => a.total_cmp(b),
            (Num(_), Str(_)) => Ordering::Less,
            (Str(_), Num(_)) => Ordering::Greater,
            (Str(a), Str(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ProcessedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for ProcessedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ProcessedValue::Missing => state.write_u8(0),
            ProcessedValue::Num(x) => {
                state.write_u8(1);
                state.write_u64(x.to_bits());
            }
            ProcessedValue::Str(s) => {
                state.write_u8(2);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for ProcessedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessedValue::Missing => f.write_str("<missing>"),
            ProcessedValue::Num(x) => write!(f, "{x}"),
            ProcessedValue::Str(s) => f.write_str(s),
        }
    }
}
