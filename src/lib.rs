//! Helios: feedback on how closely a summary paraphrases its source.
//!
//! The core is small and pure. [`cosine_similarity`] scores two embedding
//! vectors and [`classify`] maps the score onto three bands:
//!
//! | score            | category                           |
//! |------------------|------------------------------------|
//! | `> 0.85`         | [`FeedbackCategory::TooSimilar`]   |
//! | `> 0.70`         | [`FeedbackCategory::Borderline`]   |
//! | otherwise        | [`FeedbackCategory::Good`]         |
//!
//! [`SummaryAnalyzer`] glues the core to an injected [`Embedder`] from the
//! `semantic` crate and produces the [`FeedbackReport`] that the HTTP layer
//! returns.
//!
//! ```no_run
//! use std::sync::Arc;
//! use helios::SummaryAnalyzer;
//! use semantic::{SemanticConfig, SemanticEncoder};
//!
//! # async fn run() -> Result<(), helios::AnalysisError> {
//! let encoder = Arc::new(SemanticEncoder::new(SemanticConfig::stub())?);
//! let analyzer = SummaryAnalyzer::with_default_thresholds(encoder);
//! let report = analyzer
//!     .analyze("The cat sat on the mat.", "The cat sat on the mat.")
//!     .await?;
//! assert_eq!(report.status.as_str(), "too_similar");
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod error;
pub mod feedback;
pub mod similarity;

pub use analysis::SummaryAnalyzer;
pub use error::{AnalysisError, InputField};
pub use feedback::{
    BORDERLINE_THRESHOLD, FeedbackCategory, FeedbackReport, FeedbackThresholds,
    TOO_SIMILAR_THRESHOLD, classify,
};
pub use semantic::{Embedder, SemanticConfig, SemanticEncoder, SemanticError};
pub use similarity::cosine_similarity;
