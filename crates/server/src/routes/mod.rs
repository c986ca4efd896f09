//! API route handlers
//!
//! - `analyze`: summary scoring
//! - `health`: health checks, readiness, and metrics

pub mod analyze;
pub mod health;

use crate::error::ServerError;
use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Single-page UI served at `GET /`.
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
