use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salad::persistence::{self, SnapshotConfig};
use salad::room::cleanup_task::{start_cleanup_task, CleanupConfig};
use salad::room::registry::RoomRegistry;
use salad::shared::{app, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salad=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Canadian Salad game server");

    let state = AppState::new();
    let snapshot_config = SnapshotConfig::default();

    // A previous snapshot is loaded for inspection only; rooms are not
    // restored into the live registry.
    if let Some(snapshot) = persistence::load_latest_snapshot(&snapshot_config) {
        info!(
            room_count = snapshot.rooms.len(),
            taken_at = %snapshot.timestamp,
            "Found previous state snapshot"
        );
    }

    // Background tasks: abandoned-room sweep and periodic snapshots
    tokio::spawn(start_cleanup_task(
        Arc::clone(&state.registry),
        CleanupConfig::default(),
    ));
    tokio::spawn(persistence::start_snapshot_task(
        Arc::clone(&state.registry),
        snapshot_config.clone(),
    ));

    let registry = Arc::clone(&state.registry);
    let app = app(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry, snapshot_config))
        .await
        .unwrap();
}

/// Waits for ctrl-c, then saves a final snapshot before the server stops
/// accepting connections.
async fn shutdown_signal(registry: Arc<RoomRegistry>, snapshot_config: SnapshotConfig) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Shutdown signal received, saving state");
    let rooms = registry.list_rooms().await;
    persistence::save_snapshot(&snapshot_config, &rooms);
}
