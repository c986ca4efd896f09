//! Source/summary comparison on top of an injected [`Embedder`].

use std::sync::Arc;

use semantic::Embedder;

use crate::feedback::{FeedbackReport, FeedbackThresholds};
use crate::similarity::cosine_similarity;
use crate::{AnalysisError, InputField};

/// Scores summaries against their sources. Cheap to clone; the embedder is shared.
#[derive(Clone)]
pub struct SummaryAnalyzer {
    embedder: Arc<dyn Embedder>,
    thresholds: FeedbackThresholds,
}

impl std::fmt::Debug for SummaryAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryAnalyzer")
            .field("model", &self.embedder.model_name())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl SummaryAnalyzer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        thresholds: FeedbackThresholds,
    ) -> Result<Self, AnalysisError> {
        thresholds.validate()?;
        Ok(Self {
            embedder,
            thresholds,
        })
    }

    /// Analyzer with the default 0.85 / 0.70 bands.
    pub fn with_default_thresholds(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            thresholds: FeedbackThresholds::default(),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn thresholds(&self) -> &FeedbackThresholds {
        &self.thresholds
    }

    /// Embeds both texts in one provider call and classifies their cosine similarity.
    ///
    /// Empty or whitespace-only input is rejected before the provider is touched.
    pub async fn analyze(
        &self,
        source: &str,
        summary: &str,
    ) -> Result<FeedbackReport, AnalysisError> {
        if source.trim().is_empty() {
            return Err(AnalysisError::EmptyInput(InputField::Source));
        }
        if summary.trim().is_empty() {
            return Err(AnalysisError::EmptyInput(InputField::Summary));
        }

        let vectors = self.embedder.embed(&[source, summary]).await?;
        let [source_vec, summary_vec] = vectors.as_slice() else {
            return Err(semantic::SemanticError::Inference(format!(
                "expected 2 embeddings, provider returned {}",
                vectors.len()
            ))
            .into());
        };

        let similarity = cosine_similarity(source_vec, summary_vec)?;
        let status = self.thresholds.classify(similarity);
        tracing::debug!(
            similarity,
            status = status.as_str(),
            source_chars = source.chars().count(),
            summary_chars = summary.chars().count(),
            "summary analyzed"
        );

        Ok(FeedbackReport::new(similarity, status))
    }
}
