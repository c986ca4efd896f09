use crate::config::ServerConfig;
use crate::error::ServerResult;
use helios::{Embedder, SummaryAnalyzer};
use metrics_exporter_prometheus::PrometheusHandle;
use semantic::SemanticEncoder;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Analyzer wrapping the process-wide embedder
    pub analyzer: SummaryAnalyzer,

    /// Prometheus handle; `None` when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl ServerState {
    /// Build state with a [`SemanticEncoder`] made from `config.semantic`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let encoder = SemanticEncoder::new(config.semantic.clone())?;
        Self::with_embedder(config, Arc::new(encoder))
    }

    /// Build state around any embedder.
    pub fn with_embedder(config: ServerConfig, embedder: Arc<dyn Embedder>) -> ServerResult<Self> {
        let analyzer = SummaryAnalyzer::new(embedder, config.feedback)?;
        Ok(Self {
            config: Arc::new(config),
            analyzer,
            metrics_handle: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Backend actually serving requests; reflects a fallback to the stub.
    pub fn backend(&self) -> &str {
        self.analyzer.embedder().backend()
    }

    pub fn model_name(&self) -> &str {
        self.analyzer.embedder().model_name()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer)
            .field("backend", &self.backend())
            .field("metrics", &self.metrics_handle.is_some())
            .finish()
    }
}
