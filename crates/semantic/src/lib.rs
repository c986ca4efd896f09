//! Helios sentence embeddings
//!
//! Turns text into dense vectors that can be compared with cosine similarity.
//! Everything outside this crate talks to it through the [`Embedder`] trait;
//! [`SemanticEncoder`] is the configurable implementation.
//!
//! Three backends:
//!
//! - **ONNX** - runs a sentence-transformer export (all-MiniLM-L6-v2 by default)
//!   locally through ONNX Runtime. Requires model + tokenizer files, which are
//!   downloaded on first use when URLs are configured.
//! - **API** - posts to a remote embedding endpoint (Hugging Face, OpenAI, or a
//!   custom `{"texts": [...]}` service).
//! - **Stub** - deterministic hashed bag-of-words. No files, no network. Used for
//!   offline runs and tests.
//!
//! When ONNX assets are missing and `allow_stub_fallback` is set, the encoder
//! logs a warning and serves stub vectors rather than failing every request.
//! [`SemanticEncoder::active_mode`] and [`Embedder::backend`] then report `stub`.
//!
//! ## Threading notes
//!
//! Tokenizers and ONNX sessions are cached per thread. The first call on any
//! thread pays for loading the model; later calls reuse it.
//!
//! ## Quick example
//!
//! ```no_run
//! use semantic::{Embedder, SemanticConfig, SemanticEncoder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), semantic::SemanticError> {
//!     let encoder = SemanticEncoder::new(SemanticConfig::default())?;
//!     encoder.warm_up().await?;
//!     let vectors = encoder.embed(&["The cat sat on the mat."]).await?;
//!     assert_eq!(vectors.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod retry;
pub mod types;
mod serde_millis;

mod api;
mod assets;
mod cache;
mod normalize;
mod onnx;
mod stub;

pub use crate::config::{EmbeddingMode, SemanticConfig};
pub use crate::error::SemanticError;
pub use crate::retry::RetryConfig;
pub use crate::types::Embedder;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::{build_http_client, embed_via_api};
use crate::assets::{is_missing_asset, resolve_model_assets};
use crate::cache::get_or_load_model_handle;
use crate::normalize::l2_normalize_in_place;
use crate::onnx::run_onnx_embeddings;
use crate::stub::make_stub_embedding;

/// Configured embedding provider. Construct once per process and share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SemanticEncoder {
    cfg: SemanticConfig,
    http: Option<reqwest::Client>,
    /// Set while ONNX requests are being served by the stub.
    fell_back: Arc<AtomicBool>,
}

impl SemanticEncoder {
    /// Validates `cfg` and prepares the HTTP client for API mode.
    pub fn new(cfg: SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let http = match cfg.mode {
            EmbeddingMode::Api => Some(build_http_client(&cfg)?),
            _ => None,
        };
        Ok(Self {
            cfg,
            http,
            fell_back: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.cfg
    }

    /// Configured backend.
    pub fn mode(&self) -> EmbeddingMode {
        self.cfg.mode
    }

    /// Backend that served the most recent call: [`EmbeddingMode::Stub`] while an
    /// ONNX encoder is falling back, otherwise the configured one.
    pub fn active_mode(&self) -> EmbeddingMode {
        if self.fell_back.load(Ordering::Relaxed) {
            EmbeddingMode::Stub
        } else {
            self.cfg.mode
        }
    }

    /// Loads the model on the calling thread (ONNX) so the first real request
    /// does not pay for it. A no-op for the other backends.
    pub async fn warm_up(&self) -> Result<(), SemanticError> {
        if self.cfg.mode == EmbeddingMode::Onnx {
            self.embed_texts(&["warm up"]).await?;
        }
        Ok(())
    }

    /// Embeds `texts` in one backend call, preserving order.
    pub async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = match self.cfg.mode {
            EmbeddingMode::Stub => return Ok(self.stub_vectors(texts)),
            EmbeddingMode::Api => {
                let client = self.http.as_ref().ok_or_else(|| {
                    SemanticError::InvalidConfig("http client not initialised".into())
                })?;
                embed_via_api(client, texts, &self.cfg).await?
            }
            EmbeddingMode::Onnx => match self.embed_onnx(texts).await {
                Err(err) if self.cfg.allow_stub_fallback && is_missing_asset(&err) => {
                    if !self.fell_back.swap(true, Ordering::Relaxed) {
                        tracing::warn!(error = %err, "model assets unavailable, serving stub embeddings");
                    }
                    return Ok(self.stub_vectors(texts));
                }
                Ok(vectors) => {
                    if self.fell_back.swap(false, Ordering::Relaxed) {
                        tracing::info!(model = %self.cfg.model_name, "model assets available again");
                    }
                    vectors
                }
                Err(err) => return Err(err),
            },
        };

        if self.cfg.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }
        Ok(vectors)
    }

    async fn embed_onnx(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let assets = resolve_model_assets(&self.cfg).await?;
        // No await past this point: the handle is a thread-local Rc.
        let handle = get_or_load_model_handle(&assets, self.cfg.max_sequence_length)?;
        let vectors = run_onnx_embeddings(handle.as_ref(), texts)?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "model returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn stub_vectors(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts
            .iter()
            .map(|text| make_stub_embedding(text, &self.cfg))
            .collect()
    }
}

#[async_trait]
impl Embedder for SemanticEncoder {
    fn model_name(&self) -> &str {
        match self.active_mode() {
            EmbeddingMode::Stub => "stub",
            _ => &self.cfg.model_name,
        }
    }

    fn backend(&self) -> &str {
        self.active_mode().as_str()
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        self.embed_texts(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn missing_assets(allow_stub_fallback: bool) -> SemanticConfig {
        SemanticConfig {
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            allow_stub_fallback,
            ..SemanticConfig::default()
        }
    }

    #[tokio::test]
    async fn stub_mode_is_deterministic() {
        let encoder = SemanticEncoder::new(SemanticConfig::stub()).unwrap();
        let a = encoder.embed(&["big cat"]).await.unwrap();
        let b = encoder.embed(&["big cat"]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 384);
    }

    #[tokio::test]
    async fn preserves_input_order() {
        let encoder = SemanticEncoder::new(SemanticConfig::stub()).unwrap();
        let batch = encoder.embed(&["first doc", "second doc"]).await.unwrap();
        let first = encoder.embed(&["first doc"]).await.unwrap();
        let second = encoder.embed(&["second doc"]).await.unwrap();
        assert_eq!(batch, vec![first[0].clone(), second[0].clone()]);
    }

    #[tokio::test]
    async fn empty_batch_returns_nothing() {
        let encoder = SemanticEncoder::new(SemanticConfig::default()).unwrap();
        assert!(encoder.embed(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_stub_when_model_missing() {
        let cfg = missing_assets(true);
        let encoder = SemanticEncoder::new(cfg.clone()).unwrap();
        let vectors = encoder.embed(&["fallback text"]).await.unwrap();
        assert_eq!(vectors[0], make_stub_embedding("fallback text", &cfg));
    }

    #[tokio::test]
    async fn fallback_is_reported_as_stub() {
        let encoder = SemanticEncoder::new(missing_assets(true)).unwrap();
        assert_eq!(encoder.active_mode(), EmbeddingMode::Onnx);
        assert_eq!(encoder.model_name(), "all-MiniLM-L6-v2");

        encoder.warm_up().await.unwrap();
        assert_eq!(encoder.mode(), EmbeddingMode::Onnx);
        assert_eq!(encoder.active_mode(), EmbeddingMode::Stub);
        assert_eq!(encoder.backend(), "stub");
        assert_eq!(encoder.model_name(), "stub");
    }

    #[tokio::test]
    async fn missing_model_is_an_error_without_fallback() {
        let encoder = SemanticEncoder::new(missing_assets(false)).unwrap();
        let err = encoder.embed(&["text"]).await.unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn warm_up_tolerates_fallback() {
        let encoder = SemanticEncoder::new(missing_assets(true)).unwrap();
        assert!(encoder.warm_up().await.is_ok());
    }

    #[test]
    fn api_mode_without_url_is_rejected_up_front() {
        let cfg = SemanticConfig {
            mode: EmbeddingMode::Api,
            ..SemanticConfig::default()
        };
        assert!(matches!(
            SemanticEncoder::new(cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }

    #[test]
    fn model_name_reflects_backend() {
        let stub = SemanticEncoder::new(SemanticConfig::stub()).unwrap();
        assert_eq!(stub.model_name(), "stub");
        let onnx = SemanticEncoder::new(SemanticConfig::default()).unwrap();
        assert_eq!(onnx.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(onnx.mode(), EmbeddingMode::Onnx);
    }

    #[tokio::test]
    #[ignore = "requires local ONNX + tokenizer assets under models/"]
    async fn real_model_scores_paraphrases_higher() {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let workspace_root = manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root");
        let model_dir = workspace_root.join("models").join("all-MiniLM-L6-v2");

        let cfg = SemanticConfig {
            model_path: model_dir.join("onnx").join("model.onnx"),
            tokenizer_path: Some(model_dir.join("tokenizer.json")),
            allow_stub_fallback: false,
            ..SemanticConfig::default()
        };
        let encoder = SemanticEncoder::new(cfg).unwrap();
        let v = encoder
            .embed(&[
                "The cat sat on the mat.",
                "A cat was sitting on the rug.",
                "Stock markets fell sharply today.",
            ])
            .await
            .expect("inference should succeed with real model");

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert_eq!(v[0].len(), 384);
        assert!(dot(&v[0], &v[1]) > dot(&v[0], &v[2]));
    }
}
