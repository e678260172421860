//! Unified API router
//!
//! ## Endpoint Map
//!
//! | Path         | Description                              |
//! |--------------|------------------------------------------|
//! | `/health`    | Liveness probe with engine status        |
//! | `/analyze`   | Detect and validate PII                  |
//! | `/anonymize` | Detect, validate and render with policy  |

use crate::privacy::engine::EngineStatus;
use crate::privacy::handler::{pii_router, PiiState};
use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete HTTP application
pub fn build_app(state: PiiState, cors_origins: &[String]) -> Router {
    let cors = build_cors(cors_origins);

    let health = Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone());

    Router::new()
        .merge(health)
        .merge(pii_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    engine: EngineStatus,
}

async fn health_check(State(state): State<PiiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.analyzer.status(),
    })
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}
