//! HTTP adapters - service routes.
//!
//! - `GET /health` - liveness plus hub occupancy
//! - `GET /ws/groups/:room_id` - chat WebSocket (see `adapters::websocket`)

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::hub::ChatHub;

/// Health check endpoint
async fn health_check(State(hub): State<ChatHub>) -> impl IntoResponse {
    let registry = hub.registry();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "connections": registry.connection_count().await,
            "rooms": registry.room_count().await,
        })),
    )
}

/// Create the health router.
pub fn health_router(hub: ChatHub) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(hub)
}

/// Allow the listed browser origins, or any origin when the list is empty.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    }
}

/// Create the complete application router.
///
/// `request_timeout` bounds plain HTTP requests. Upgraded sockets are served
/// outside the request future and are not affected.
pub fn app_router(
    ws_state: WebSocketState,
    cors_origins: &[String],
    request_timeout: Duration,
) -> Router {
    let hub = ws_state.hub.clone();
    Router::new()
        .merge(health_router(hub).layer(TimeoutLayer::new(request_timeout)))
        .merge(websocket_router(ws_state))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}
