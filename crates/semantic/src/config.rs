use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;
use crate::SemanticError;

/// Which backend produces the vectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Local ONNX Runtime inference over a sentence-transformer export.
    #[default]
    Onnx,
    /// Remote HTTP embedding endpoint.
    Api,
    /// Deterministic hashed bag-of-words vectors. No model files required.
    #[serde(alias = "fast")]
    Stub,
}

impl EmbeddingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingMode::Onnx => "onnx",
            EmbeddingMode::Api => "api",
            EmbeddingMode::Stub => "stub",
        }
    }
}

/// Runtime configuration describing which model/tokenizer to use and how to post-process vectors.
///
/// Every field has a default, so partial config files and environment overrides
/// deserialize cleanly.
///
/// # Example
/// ```no_run
/// use semantic::{EmbeddingMode, SemanticConfig, SemanticEncoder};
///
/// let cfg = SemanticConfig {
///     mode: EmbeddingMode::Api,
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
///
/// let encoder = SemanticEncoder::new(cfg).expect("valid config");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Backend selector.
    pub mode: EmbeddingMode,
    /// Friendly label surfaced in readiness output and API payloads.
    pub model_name: String,
    /// Local path where the ONNX file should live (also used as the download target when
    /// [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS URL that will be downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is provided we
    /// infer the filename from the URL and place it next to the model file.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Tokens beyond this length are truncated before inference.
    pub max_sequence_length: usize,
    /// API inference endpoint when [`mode`](Self::mode) is [`EmbeddingMode::Api`].
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: u64,
    /// Retry policy for API calls. `None` disables retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    /// Normalize the resulting vector to unit-length.
    pub normalize: bool,
    /// Dimension of stub vectors. Matches all-MiniLM-L6-v2 by default.
    pub stub_dim: usize,
    /// Serve stub vectors instead of failing when ONNX assets cannot be found or downloaded.
    pub allow_stub_fallback: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Onnx,
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json")),
            tokenizer_url: None,
            max_sequence_length: 256,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: 30,
            retry_config: Some(RetryConfig::default()),
            normalize: true,
            stub_dim: 384,
            allow_stub_fallback: true,
        }
    }
}

impl SemanticConfig {
    /// Config for the model-free stub backend.
    pub fn stub() -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            ..Default::default()
        }
    }

    /// Rejects combinations that can never produce a vector.
    pub fn validate(&self) -> Result<(), SemanticError> {
        match self.mode {
            EmbeddingMode::Api if self.api_url.as_deref().is_none_or(str::is_empty) => Err(
                SemanticError::InvalidConfig("api_url is required for api mode".into()),
            ),
            EmbeddingMode::Onnx if self.max_sequence_length == 0 => Err(
                SemanticError::InvalidConfig("max_sequence_length must be positive".into()),
            ),
            EmbeddingMode::Stub if self.stub_dim == 0 => Err(SemanticError::InvalidConfig(
                "stub_dim must be positive".into(),
            )),
            _ => Ok(()),
        }
    }
}
