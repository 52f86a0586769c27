//! Field values and the record boundary.
//!
//! This module owns the types records are made of ([`FieldValue`],
//! [`ProcessedValue`]) and the [`DataSource`] trait the host engine
//! implements to hand records to the pipeline.

mod source;
mod value;

pub use source::{DataSource, MapDataSource, TermStats};
pub use value::{FieldValue, ProcessedValue};
