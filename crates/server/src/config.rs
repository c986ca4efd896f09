use helios::FeedbackThresholds;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level, or any `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Load the embedding model before accepting traffic
    #[serde(default = "default_true")]
    pub warm_up: bool,

    /// Embedding backend
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Feedback band bounds
    #[serde(default)]
    pub feedback: FeedbackThresholds,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            warm_up: default_true(),
            semantic: SemanticConfig::default(),
            feedback: FeedbackThresholds::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `helios.{toml,yaml,json}` file and
    /// `HELIOS__*` environment variables, in increasing priority.
    pub fn load() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            return Err(err.into());
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("helios").required(false))
            .add_source(config::Environment::with_prefix("HELIOS").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.feedback.validate()?;
        Ok(config)
    }

    /// Config with the stub embedder and no warm-up; used by tests and offline runs.
    pub fn offline() -> Self {
        Self {
            warm_up: false,
            semantic: SemanticConfig::stub(),
            ..Self::default()
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_kb() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use semantic::EmbeddingMode;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 10000);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_body_size(), 1024 * 1024);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.semantic.mode, EmbeddingMode::Onnx);
        assert_eq!(cfg.feedback, FeedbackThresholds::default());
    }

    #[test]
    fn test_socket_addr() {
        let addr = ServerConfig::default().socket_addr().unwrap();
        assert_eq!(addr.port(), 10000);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn nested_sections_deserialize() {
        let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
            "port": 8081,
            "semantic": { "mode": "stub", "stub_dim": 64 },
            "feedback": { "too_similar": 0.9 }
        }))
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.semantic.mode, EmbeddingMode::Stub);
        assert_eq!(cfg.semantic.stub_dim, 64);
        assert_eq!(cfg.feedback.too_similar, 0.9);
        assert_eq!(cfg.feedback.borderline, 0.70);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn offline_uses_stub() {
        let cfg = ServerConfig::offline();
        assert_eq!(cfg.semantic.mode, EmbeddingMode::Stub);
        assert!(!cfg.warm_up);
    }
}
