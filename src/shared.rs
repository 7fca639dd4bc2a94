use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::room::registry::RoomRegistry;
use crate::websockets::ConnectionManager;

/// Grace window after a disconnect before the player is removed for good.
pub const DISCONNECT_GRACE_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub connections: Arc<ConnectionManager>,
    pub disconnect_grace: Duration,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            connections: Arc::new(ConnectionManager::new()),
            disconnect_grace: DISCONNECT_GRACE_PERIOD,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the HTTP router: health check plus the game WebSocket.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(crate::websockets::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rooms": state.registry.room_count().await,
    }))
}
