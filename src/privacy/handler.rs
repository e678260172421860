//! HTTP handlers for the PII API
//!
//! - POST /analyze: detect and validate PII
//! - POST /anonymize: detect, validate and render with a policy

use crate::error::Error;
use crate::privacy::analyzer::PiiAnalyzer;
use crate::privacy::entity::Candidate;
use crate::privacy::policy::AnonymizationPolicy;
use crate::privacy::text::SourceText;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for PII handlers
#[derive(Clone)]
pub struct PiiState {
    pub analyzer: Arc<PiiAnalyzer>,
}

/// Create the PII router
pub fn pii_router(state: PiiState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/anonymize", post(anonymize))
        .with_state(state)
}

// =============================================================================
// Request / Response types
// =============================================================================

/// Request body for /analyze
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    /// "ru" or "en"; detected when absent
    pub language: Option<String>,
}

/// Request body for /anonymize
#[derive(Debug, Deserialize)]
pub struct AnonymizeRequest {
    pub text: String,
    pub language: Option<String>,
    /// Partial policy merged over the configured one
    pub policy: Option<serde_json::Value>,
}

/// A validated entity in a response
#[derive(Debug, Serialize)]
pub struct EntityItem {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub score: Option<f64>,
}

/// Response from /analyze
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub language: String,
    pub items: Vec<EntityItem>,
}

/// Response from /anonymize
#[derive(Debug, Serialize)]
pub struct AnonymizeResponse {
    pub text: String,
    pub language: String,
    pub items: Vec<EntityItem>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "BAD_REQUEST".to_string(),
                message: message.into(),
            },
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: message.into(),
            },
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn error_response(err: Error) -> Response {
    match err {
        Error::UnsupportedLanguage(_) | Error::Policy(_) => {
            (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(err.to_string()))).into_response()
        }
        other => {
            tracing::error!("Request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal(other.to_string())),
            )
                .into_response()
        }
    }
}

fn entity_items(text: &str, entities: &[Candidate]) -> Vec<EntityItem> {
    let source = SourceText::new(text);
    entities
        .iter()
        .map(|c| EntityItem {
            entity_type: c.entity_type.to_string(),
            start: c.start,
            end: c.end,
            text: source.slice(c.start, c.end).unwrap_or_default().to_string(),
            score: c.score,
        })
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /analyze
async fn analyze(
    State(state): State<PiiState>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    match state
        .analyzer
        .analyze(&request.text, request.language.as_deref())
    {
        Ok(analysis) => Json(AnalyzeResponse {
            language: analysis.language.language.to_string(),
            items: entity_items(&request.text, &analysis.entities),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /anonymize
async fn anonymize(
    State(state): State<PiiState>,
    Json(request): Json<AnonymizeRequest>,
) -> Response {
    let overrides = match request.policy.as_ref().map(AnonymizationPolicy::from_json) {
        Some(Ok(policy)) => Some(policy),
        Some(Err(e)) => return error_response(e),
        None => None,
    };

    match state.analyzer.anonymize(
        &request.text,
        request.language.as_deref(),
        overrides.as_ref(),
    ) {
        Ok(result) => Json(AnonymizeResponse {
            text: result.anonymized.text,
            language: result.language.language.to_string(),
            items: entity_items(&request.text, &result.entities),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_state() -> PiiState {
        let analyzer = PiiAnalyzer::from_config(&GuardConfig::default()).unwrap();
        PiiState {
            analyzer: Arc::new(analyzer),
        }
    }

    fn make_app() -> Router {
        pii_router(make_state())
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn post_json(uri: &str, body: serde_json::Value) -> Response {
        make_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_phone() {
        let resp = post_json(
            "/analyze",
            serde_json::json!({"text": "телефон +7 (912) 000-00-00", "language": "ru"}),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["language"], "ru");
        let items = json["items"].as_array().unwrap();
        assert!(items
            .iter()
            .any(|i| i["entity_type"] == "PHONE_NUMBER_RU" && i["text"] == "+7 (912) 000-00-00"));
    }

    #[tokio::test]
    async fn test_analyze_phone_with_non_breaking_spaces() {
        let resp = post_json(
            "/analyze",
            serde_json::json!({
                "text": "телефон +7\u{00A0}(912)\u{00A0}000\u{00A0}\u{00A0}00\u{00A0}\u{00A0}00",
                "language": "ru"
            }),
        )
        .await;

        let json = body_json(resp).await;
        let items = json["items"].as_array().unwrap();
        assert!(items.iter().any(|i| i["entity_type"] == "PHONE_NUMBER_RU"));
    }

    #[tokio::test]
    async fn test_analyze_items_carry_offsets_and_score() {
        let resp = post_json(
            "/analyze",
            serde_json::json!({"text": "ИНН 7736050003", "language": "ru"}),
        )
        .await;

        let json = body_json(resp).await;
        let item = &json["items"][0];
        assert_eq!(item["entity_type"], "RU_INN");
        assert_eq!(item["start"], 4);
        assert_eq!(item["end"], 14);
        assert_eq!(item["text"], "7736050003");
        assert!(item["score"].as_f64().unwrap() > 0.5);
    }

    #[tokio::test]
    async fn test_analyze_detects_language() {
        let resp = post_json(
            "/analyze",
            serde_json::json!({"text": "Call me at +44 20 7946 0958 please"}),
        )
        .await;

        let json = body_json(resp).await;
        assert_eq!(json["language"], "en");
        let items = json["items"].as_array().unwrap();
        assert!(items.iter().any(|i| i["entity_type"] == "PHONE_NUMBER"));
    }

    #[tokio::test]
    async fn test_analyze_unsupported_language() {
        let resp = post_json(
            "/analyze",
            serde_json::json!({"text": "Guten Tag", "language": "de"}),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Only 'ru' or 'en'"));
    }

    #[tokio::test]
    async fn test_anonymize_default_policy() {
        let resp = post_json(
            "/anonymize",
            serde_json::json!({"text": "ИНН 500100732259, карта 4111 1111 1111 1111", "language": "ru"}),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let text = json["text"].as_str().unwrap();
        assert!(!text.contains("500100732259"));
        assert!(!text.contains("4111"));
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_anonymize_request_policy() {
        let resp = post_json(
            "/anonymize",
            serde_json::json!({
                "text": "ИНН 7736050003",
                "language": "ru",
                "policy": {"RU_INN": {"type": "replace", "new_value": "<ИНН>"}}
            }),
        )
        .await;

        let json = body_json(resp).await;
        assert_eq!(json["text"], "ИНН <ИНН>");
    }

    #[tokio::test]
    async fn test_anonymize_policy_without_type() {
        let resp = post_json(
            "/anonymize",
            serde_json::json!({
                "text": "ИНН 7736050003",
                "policy": {"default": {"new_value": "value without type"}}
            }),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"]["message"].as_str().unwrap().contains("'type'"));
    }
}
