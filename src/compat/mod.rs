//! Foreign model format support.
//!
//! This module provides parsing of model interchange formats and
//! conversion to native `scorers` types. Only PMML is implemented; the
//! JSON vector spec, being this engine's own format, lives in
//! [`crate::spec`].

pub mod pmml;
