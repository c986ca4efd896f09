use serde_json::{json, Value};
use std::time::Duration;

use crate::retry::execute_with_retry;
use crate::{SemanticConfig, SemanticError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

pub(crate) fn build_http_client(cfg: &SemanticConfig) -> Result<reqwest::Client, SemanticError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.api_timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))
}

/// Embeds `texts` with a single remote call, retrying transient failures.
pub(crate) async fn embed_via_api(
    client: &reqwest::Client,
    texts: &[&str],
    cfg: &SemanticConfig,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
    let payload = build_api_payload(api_provider_kind(cfg), texts, cfg);

    let response = match &cfg.retry_config {
        Some(retry) => {
            execute_with_retry(retry, |_| send_api_request(client, url, cfg, &payload)).await?
        }
        None => send_api_request(client, url, cfg, &payload).await?,
    };

    let vectors = parse_embeddings_from_value(response)?;
    if vectors.len() != texts.len() {
        return Err(SemanticError::Inference(format!(
            "API returned {} embeddings for {} inputs",
            vectors.len(),
            texts.len()
        )));
    }
    Ok(vectors)
}

fn api_provider_kind(cfg: &SemanticConfig) -> ApiProviderKind {
    match cfg
        .api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase()
        .as_str()
    {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

fn build_api_payload(provider: ApiProviderKind, texts: &[&str], cfg: &SemanticConfig) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAI => json!({ "input": texts, "model": cfg.model_name }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

async fn send_api_request(
    client: &reqwest::Client,
    url: &str,
    cfg: &SemanticConfig,
    payload: &Value,
) -> Result<Value, SemanticError> {
    let mut request = client.post(url).json(payload);
    if let Some(header) = cfg.api_auth_header.as_deref() {
        request = request.header(reqwest::header::AUTHORIZATION, header);
    }

    let response = request
        .send()
        .await
        .map_err(|e| SemanticError::Download(format!("HTTP request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SemanticError::HttpStatus {
            status: status.as_u16(),
            message: body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SemanticError::Inference(format!("invalid JSON response: {e}")))
}

/// Accepts `{"embeddings": [...]}`, OpenAI-style `{"data": [{"embedding": [...]}]}`,
/// a bare matrix, or a bare vector.
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            items.into_iter().map(parse_embedding_vector).collect()
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_from_hint() {
        let cfg = |hint: Option<&str>| SemanticConfig {
            api_provider: hint.map(str::to_string),
            ..SemanticConfig::default()
        };
        assert_eq!(api_provider_kind(&cfg(Some("HF"))), ApiProviderKind::HuggingFace);
        assert_eq!(api_provider_kind(&cfg(Some("openai"))), ApiProviderKind::OpenAI);
        assert_eq!(api_provider_kind(&cfg(None)), ApiProviderKind::Custom);
    }

    #[test]
    fn payload_shapes() {
        let cfg = SemanticConfig::default();
        let texts = ["a", "b"];
        assert_eq!(
            build_api_payload(ApiProviderKind::HuggingFace, &texts, &cfg),
            json!({ "inputs": ["a", "b"] })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::OpenAI, &texts, &cfg),
            json!({ "input": ["a", "b"], "model": "all-MiniLM-L6-v2" })
        );
        assert_eq!(
            build_api_payload(ApiProviderKind::Custom, &texts, &cfg),
            json!({ "texts": ["a", "b"] })
        );
    }

    #[test]
    fn parses_matrix_and_single_vector() {
        let matrix = parse_embeddings_from_value(json!([[1.0, 2.0], [3.0, 4.0]])).unwrap();
        assert_eq!(matrix, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let single = parse_embeddings_from_value(json!([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(single, vec![vec![1.0, 2.0, 3.0]]);

        assert!(parse_embeddings_from_value(json!([])).unwrap().is_empty());
    }

    #[test]
    fn parses_openai_and_embeddings_objects() {
        let openai = json!({ "data": [{ "embedding": [0.5, 0.5] }, { "embedding": [1.0, 0.0] }] });
        assert_eq!(
            parse_embeddings_from_value(openai).unwrap(),
            vec![vec![0.5, 0.5], vec![1.0, 0.0]]
        );

        let wrapped = json!({ "embeddings": [[0.25, 0.75]] });
        assert_eq!(
            parse_embeddings_from_value(wrapped).unwrap(),
            vec![vec![0.25, 0.75]]
        );
    }

    #[test]
    fn rejects_malformed_responses() {
        assert!(parse_embeddings_from_value(json!({ "result": [] })).is_err());
        assert!(parse_embeddings_from_value(json!({ "data": [1, 2] })).is_err());
        assert!(parse_embeddings_from_value(json!(["x", "y"])).is_err());
        assert!(parse_embeddings_from_value(json!("nope")).is_err());
    }

    #[tokio::test]
    async fn empty_batch_skips_network() {
        let cfg = SemanticConfig {
            api_url: Some("http://127.0.0.1:9/unreachable".into()),
            ..SemanticConfig::default()
        };
        let client = build_http_client(&cfg).unwrap();
        assert!(embed_via_api(&client, &[], &cfg).await.unwrap().is_empty());
    }
}
