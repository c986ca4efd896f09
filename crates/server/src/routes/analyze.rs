use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use helios::FeedbackReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Body of `POST /analyze`. Missing fields are treated as empty text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
}

/// Scores the summary against the source and returns the feedback record.
pub async fn analyze(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ServerResult<Json<FeedbackReport>> {
    let Json(request) = payload.map_err(rejected)?;

    let start = Instant::now();
    let result = state
        .analyzer
        .analyze(&request.source, &request.summary)
        .await;
    metrics::histogram!("helios_analysis_duration_seconds").record(start.elapsed().as_secs_f64());

    match result {
        Ok(report) => {
            metrics::counter!("helios_analyses_total", "status" => report.status.as_str())
                .increment(1);
            Ok(Json(report))
        }
        Err(err) => {
            let err = ServerError::from(err);
            record_failure(err.error_code());
            if !err.status_code().is_server_error() {
                tracing::debug!(code = err.error_code(), error = %err, "analysis rejected");
            }
            Err(err)
        }
    }
}

/// Counts a body the JSON extractor refused under the code it will be reported with.
fn rejected(rejection: JsonRejection) -> ServerError {
    let err = ServerError::from(rejection);
    record_failure(err.error_code());
    err
}

fn record_failure(code: &'static str) {
    metrics::counter!("helios_analysis_failures_total", "code" => code).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{Request, header};
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[tokio::test]
    async fn oversized_bodies_are_counted_as_payload_too_large() {
        // Above axum's default 2 MB extractor limit.
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b' '; 3 * 1024 * 1024]))
            .unwrap();
        let rejection = Json::<AnalyzeRequest>::from_request(request, &())
            .await
            .unwrap_err();

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let err = metrics::with_local_recorder(&recorder, || rejected(rejection));

        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        let rendered = handle.render();
        assert!(rendered.contains("helios_analysis_failures_total"));
        assert!(rendered.contains(r#"code="PAYLOAD_TOO_LARGE""#));
        assert!(!rendered.contains(r#"code="BAD_REQUEST""#));
    }
}
