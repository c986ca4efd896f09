use std::io;
use thiserror::Error;

/// Errors surfaced while producing embeddings.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no fallback URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets or reach the embedding API.
    #[error("download failed: {0}")]
    Download(String),
    /// The remote endpoint answered with a non-success status.
    #[error("HTTP error {status}: {message}")]
    HttpStatus { status: u16, message: String },
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or response-parsing errors.
    #[error("inference failure: {0}")]
    Inference(String),
}

impl Clone for SemanticError {
    fn clone(&self) -> Self {
        match self {
            SemanticError::ModelNotFound(s) => SemanticError::ModelNotFound(s.clone()),
            SemanticError::TokenizerMissing(s) => SemanticError::TokenizerMissing(s.clone()),
            SemanticError::InvalidConfig(s) => SemanticError::InvalidConfig(s.clone()),
            SemanticError::Download(s) => SemanticError::Download(s.clone()),
            SemanticError::HttpStatus { status, message } => SemanticError::HttpStatus {
                status: *status,
                message: message.clone(),
            },
            SemanticError::Io(err) => SemanticError::Io(io::Error::new(err.kind(), err.to_string())),
            SemanticError::Inference(s) => SemanticError::Inference(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = SemanticError::ModelNotFound("/path/to/model.onnx".into());
        assert!(err.to_string().contains("model file not found"));
        assert!(err.to_string().contains("/path/to/model.onnx"));

        let err = SemanticError::InvalidConfig("api_url is required".into());
        assert!(err.to_string().contains("invalid semantic config"));

        let err = SemanticError::Inference("ONNX session failed".into());
        assert!(err.to_string().contains("inference failure"));
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SemanticError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn clone_keeps_io_kind() {
        let err: SemanticError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        match err.clone() {
            SemanticError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied);
                assert!(inner.to_string().contains("nope"));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
