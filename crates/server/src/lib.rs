//! Helios Server - HTTP front end for summary similarity feedback
//!
//! Serves the Knowledge Sandbox web page and a JSON API that scores how
//! closely a summary paraphrases its source.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - Knowledge Sandbox UI
//! - `POST /analyze` - `{"source": "...", "summary": "..."}` to a feedback record
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with embedding backend details
//! - `GET /metrics` - Prometheus metrics
//!
//! Errors are returned as `{"error": {"code": "...", "message": "..."}}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
