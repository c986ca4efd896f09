use async_trait::async_trait;

use crate::SemanticError;

/// Anything that can turn text into fixed-length vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// all of the same dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Label of the underlying model, for readiness output and logs.
    fn model_name(&self) -> &str;

    /// Backend serving requests, for readiness output.
    fn backend(&self) -> &str {
        "custom"
    }

    /// Embed every entry of `texts`.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Constant(Vec<f32>);

    #[async_trait]
    impl Embedder for Constant {
        fn model_name(&self) -> &str {
            "constant"
        }

        async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }
    }

    #[tokio::test]
    async fn trait_objects_are_shareable() {
        let embedder: Arc<dyn Embedder> = Arc::new(Constant(vec![1.0, 2.0]));
        let clone = Arc::clone(&embedder);
        let handle = tokio::spawn(async move { clone.embed(&["a", "b"]).await });
        let vectors = handle.await.unwrap().unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0], vec![1.0, 2.0]]);
        assert_eq!(embedder.model_name(), "constant");
        assert_eq!(embedder.backend(), "custom");
    }
}
