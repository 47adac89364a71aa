// src/error.rs

use thiserror::Error;

/// Result alias used throughout the forward-modelling engine.
pub type ModelResult<T> = Result<T, ModelError>;

/// Everything that can go wrong between "user typed some numbers" and
/// "a value came back out of the grid". All variants are recoverable.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A numeric input could not be parsed, or parsed to NaN/inf.
    #[error("invalid value for {field}: '{value}' is not a finite number")]
    Validation { field: String, value: String },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid smoothing kernel size {size}: {reason}")]
    InvalidKernel { size: usize, reason: String },

    #[error("source index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Query point lies outside the cached grid. Not a numeric zero.
    #[error("point ({x}, {y}) lies outside the model grid")]
    DomainMiss { x: f64, y: f64 },

    /// Sampling was attempted before any model run.
    #[error("no model has been run yet; run the model before interpolating")]
    StaleCache,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl ModelError {
    pub fn validation(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Parse a user-supplied number, trimming whitespace and rejecting NaN/inf.
pub fn parse_finite(field: &str, raw: &str) -> ModelResult<f64> {
    let t = raw.trim();
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ModelError::validation(field, raw)),
    }
}
