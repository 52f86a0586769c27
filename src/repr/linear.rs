//! Generalized linear model representation.

use ndarray::{Array1, Array2, ArrayView1};

/// Link from per-class scores to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFunction {
    /// Binary logistic: sigmoid of the two-class margin against 0.5.
    Logit,
    /// No calibration: raw two-class margin against 0 (SVM-style).
    None,
    /// Multinomial logistic: softmax over per-class scores.
    Softmax,
}

/// Coefficient table for regression-family models.
///
/// Stores coefficients as an `Array2<f64>` with shape
/// `[n_slots, n_classes]`:
///
/// ```text
/// coefficients[[slot, class]] → coefficient
/// intercepts[class]           → per-class intercept
/// ```
///
/// The slot dimension is pinned to the vectorizer that was built from the
/// same parameter table: `coefficients[[i, c]]` multiplies exactly the
/// vector entry the builder assigned index `i`. Immutable once built and
/// freely shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralizedLinearModel {
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
    classes: Vec<String>,
    link: LinkFunction,
}

impl GeneralizedLinearModel {
    /// Create a model from its parts.
    ///
    /// # Panics
    ///
    /// Asserts the shapes agree: one coefficient column and one intercept
    /// per class. A mismatch is a factory defect, not caller input.
    pub fn new(
        coefficients: Array2<f64>,
        intercepts: Array1<f64>,
        classes: Vec<String>,
        link: LinkFunction,
    ) -> Self {
        assert_eq!(
            coefficients.ncols(),
            classes.len(),
            "coefficient columns ({}) don't match classes ({})",
            coefficients.ncols(),
            classes.len()
        );
        assert_eq!(
            intercepts.len(),
            classes.len(),
            "intercepts ({}) don't match classes ({})",
            intercepts.len(),
            classes.len()
        );
        if matches!(link, LinkFunction::Logit | LinkFunction::None) {
            assert_eq!(
                classes.len(),
                2,
                "binary link with {} target categories",
                classes.len()
            );
        }
        Self {
            coefficients,
            intercepts,
            classes,
            link,
        }
    }

    /// Number of vector slots the coefficient table covers.
    #[inline]
    pub fn n_slots(&self) -> usize {
        self.coefficients.nrows()
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[inline]
    pub fn link(&self) -> LinkFunction {
        self.link
    }

    /// Coefficient column for one class.
    #[inline]
    pub fn class_coefficients(&self, class: usize) -> ArrayView1<'_, f64> {
        self.coefficients.column(class)
    }

    #[inline]
    pub fn intercept(&self, class: usize) -> f64 {
        self.intercepts[class]
    }
}
