use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use helios::AnalysisError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Analysis(err) => match err {
                AnalysisError::EmptyInput(_) => StatusCode::BAD_REQUEST,
                AnalysisError::DimensionMismatch { .. }
                | AnalysisError::ZeroVector
                | AnalysisError::NonFinite => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::InvalidThresholds(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AnalysisError::Embedding(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Analysis(err) => match err {
                AnalysisError::EmptyInput(_) => "EMPTY_INPUT",
                AnalysisError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
                AnalysisError::ZeroVector => "ZERO_VECTOR",
                AnalysisError::NonFinite => "NON_FINITE_EMBEDDING",
                AnalysisError::InvalidThresholds(_) => "CONFIG_ERROR",
                AnalysisError::Embedding(_) => "EMBEDDING_ERROR",
            },
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ServerError::PayloadTooLarge(rejection.body_text()),
            _ => ServerError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<semantic::SemanticError> for ServerError {
    fn from(err: semantic::SemanticError) -> Self {
        match err {
            semantic::SemanticError::InvalidConfig(msg) => ServerError::Config(msg),
            other => ServerError::Analysis(AnalysisError::Embedding(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios::InputField;
    use semantic::SemanticError;

    #[test]
    fn analysis_errors_map_to_status_and_code() {
        let cases = [
            (
                AnalysisError::EmptyInput(InputField::Source),
                StatusCode::BAD_REQUEST,
                "EMPTY_INPUT",
            ),
            (
                AnalysisError::DimensionMismatch { left: 3, right: 2 },
                StatusCode::UNPROCESSABLE_ENTITY,
                "DIMENSION_MISMATCH",
            ),
            (
                AnalysisError::ZeroVector,
                StatusCode::UNPROCESSABLE_ENTITY,
                "ZERO_VECTOR",
            ),
            (
                AnalysisError::NonFinite,
                StatusCode::UNPROCESSABLE_ENTITY,
                "NON_FINITE_EMBEDDING",
            ),
            (
                AnalysisError::InvalidThresholds("inverted".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
            ),
            (
                AnalysisError::Embedding(SemanticError::Download("offline".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "EMBEDDING_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            let err = ServerError::from(err);
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn analysis_message_is_not_wrapped() {
        let err = ServerError::from(AnalysisError::EmptyInput(InputField::Summary));
        assert_eq!(err.to_string(), "summary text is empty");
    }

    #[test]
    fn invalid_semantic_config_is_a_config_error() {
        let err = ServerError::from(SemanticError::InvalidConfig("api_url missing".into()));
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        let err = ServerError::from(SemanticError::Inference("bad tensor".into()));
        assert_eq!(err.error_code(), "EMBEDDING_ERROR");
    }
}
