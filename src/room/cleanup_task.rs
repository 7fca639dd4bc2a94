use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument};

use super::registry::RoomRegistry;

/// Configuration for the room cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often the sweep runs
    pub cleanup_interval: Duration,
    /// How long a room may be idle before deletion
    pub inactivity_threshold: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(10 * 60), // 10 minutes
            inactivity_threshold: Duration::from_secs(4 * 60 * 60), // 4 hours
        }
    }
}

/// Background task that periodically deletes abandoned rooms. This is the
/// garbage-collection safety net behind the per-disconnect grace checks.
#[instrument(skip(registry))]
pub async fn start_cleanup_task(registry: Arc<RoomRegistry>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        inactivity_threshold_secs = config.inactivity_threshold.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        let removed = registry
            .sweep_expired_rooms(config.inactivity_threshold)
            .await;
        if !removed.is_empty() {
            info!(deleted_count = removed.len(), "Room cleanup completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_removes_inactive_rooms() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.create_room("test-host", "Alice").await;

        tokio::time::sleep(Duration::from_millis(10)).await;

        let removed = registry
            .sweep_expired_rooms(Duration::from_millis(1))
            .await;
        assert_eq!(removed.len(), 1);
        assert!(registry.get_room(&room.code).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_preserves_active_rooms() {
        let registry = Arc::new(RoomRegistry::new());
        let room = registry.create_room("test-host", "Alice").await;

        let removed = registry
            .sweep_expired_rooms(CleanupConfig::default().inactivity_threshold)
            .await;
        assert!(removed.is_empty());
        assert!(registry.get_room(&room.code).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_handles_multiple_rooms() {
        let registry = Arc::new(RoomRegistry::new());
        for i in 0..3 {
            registry
                .create_room(&format!("host-{}", i), &format!("Host {}", i))
                .await;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;

        let removed = registry
            .sweep_expired_rooms(Duration::from_millis(1))
            .await;
        assert_eq!(removed.len(), 3);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_with_no_rooms() {
        let registry = Arc::new(RoomRegistry::new());
        let removed = registry
            .sweep_expired_rooms(Duration::from_millis(1))
            .await;
        assert!(removed.is_empty());
    }
}
