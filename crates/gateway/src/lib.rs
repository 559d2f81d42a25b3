//! HTTP API gateway for Corretor.
//!
//! Exposes the chatbot endpoint and a health check. Every request is a
//! single-turn conversation: the gateway keeps no history between calls.
//!
//! Built on Axum for high performance async HTTP.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use corretor_agent::{TurnOrchestrator, build_messages};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub system_prompt: String,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS open to any origin, method, and header
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chatbot", post(chatbot_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(
    config: corretor_config::AppConfig,
    orchestrator: Arc<TurnOrchestrator>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let state = Arc::new(GatewayState {
        orchestrator,
        system_prompt: corretor_agent::system_prompt(
            config.prompt.system_prompt_override.as_deref(),
        ),
    });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatbotRequest {
    query: String,
}

#[derive(Serialize)]
struct ChatbotResponse {
    response: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

async fn chatbot_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatbotRequest>,
) -> Response {
    info!(query_len = payload.query.len(), "Chatbot query received");

    let messages = build_messages(&state.system_prompt, &[], &payload.query, 0);

    match state.orchestrator.answer(messages).await {
        Ok(report) => {
            info!(
                requests = report.requests,
                data_fetched = report.data_fetched,
                response_len = report.answer.len(),
                "Chatbot query answered"
            );
            utf8_json(
                StatusCode::OK,
                &ChatbotResponse {
                    response: report.answer,
                },
            )
        }
        Err(e) => {
            error!(error = %e, "Chatbot turn failed");
            utf8_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse {
                    detail: format!("Error: {e}"),
                },
            )
        }
    }
}

/// JSON body with an explicit UTF-8 charset; non-ASCII text is written as is.
fn utf8_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, JSON_UTF8)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
