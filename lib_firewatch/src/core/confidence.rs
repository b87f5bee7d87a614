//! # Confidence Synthesis
//!
//! When a detection arrives without a confidence value, the ingestion path asks
//! a [`ConfidenceEstimator`] for one. Historical detections recovered from the
//! log never recorded confidence either and go through the same estimator.
//!
//! The default [`UniformConfidence`] is a placeholder signal-quality estimate,
//! not a measurement: it draws uniformly from the closed interval
//! `[0.55, 0.95]`. A real model can replace it by implementing the trait; the
//! ingestion contract does not change.

use rand::Rng;
use thiserror::Error;

/// Lower bound of the default synthesized confidence interval.
pub const SYNTH_CONFIDENCE_MIN: f64 = 0.55;
/// Upper bound of the default synthesized confidence interval.
pub const SYNTH_CONFIDENCE_MAX: f64 = 0.95;

#[derive(Debug, Error, PartialEq)]
pub enum ConfidenceError {
    #[error("Confidence interval [{low}, {high}] must satisfy 0 <= low <= high <= 1")]
    InvalidInterval { low: f64, high: f64 },
}

/// Produces a confidence value in `[0, 1]` for a detection that has none.
///
/// Implementations document the interval their values fall in.
pub trait ConfidenceEstimator: Send + Sync {
    fn estimate(&self) -> f64;
}

/// # Uniform Confidence
///
/// Draws uniformly from `[low, high]` (both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformConfidence {
    low: f64,
    high: f64,
}

impl Default for UniformConfidence {
    fn default() -> Self {
        Self {
            low: SYNTH_CONFIDENCE_MIN,
            high: SYNTH_CONFIDENCE_MAX,
        }
    }
}

impl UniformConfidence {
    pub fn new(low: f64, high: f64) -> Result<Self, ConfidenceError> {
        let valid = low.is_finite() && high.is_finite() && 0.0 <= low && low <= high && high <= 1.0;
        if !valid {
            return Err(ConfidenceError::InvalidInterval { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

impl ConfidenceEstimator for UniformConfidence {
    fn estimate(&self) -> f64 {
        rand::rng().random_range(self.low..=self.high)
    }
}

/// Always returns the same value. Useful where determinism matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedConfidence(pub f64);

impl ConfidenceEstimator for FixedConfidence {
    fn estimate(&self) -> f64 {
        self.0
    }
}
