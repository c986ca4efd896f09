use std::fmt;

use semantic::SemanticError;
use thiserror::Error;

/// Which of the two texts a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Source,
    Summary,
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputField::Source => "source",
            InputField::Summary => "summary",
        })
    }
}

/// Errors raised while scoring a summary against its source. All of them are
/// scoped to one request.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Text was empty or whitespace-only; rejected before any embedding work.
    #[error("{0} text is empty")]
    EmptyInput(InputField),
    /// The two vectors have different lengths.
    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
    /// One side has zero magnitude, so there is no similarity signal.
    #[error("an embedding has zero magnitude; no meaningful similarity")]
    ZeroVector,
    /// NaN or infinity in the vectors.
    #[error("embedding contains non-finite values")]
    NonFinite,
    #[error("invalid feedback thresholds: {0}")]
    InvalidThresholds(String),
    #[error("embedding failed: {0}")]
    Embedding(#[from] SemanticError),
}

impl AnalysisError {
    /// True for errors caused by what the caller sent rather than by the service.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyInput(_)
                | AnalysisError::DimensionMismatch { .. }
                | AnalysisError::ZeroVector
                | AnalysisError::NonFinite
        )
    }
}
