use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

use crate::room::registry::RoomRegistry;
use crate::room::models::RoomModel;

/// Configuration for periodic state snapshots
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Directory snapshot files are written to
    pub state_dir: PathBuf,
    /// How often a snapshot is taken
    pub snapshot_interval: Duration,
    /// How many snapshot files to retain
    pub keep_count: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("game-states"),
            snapshot_interval: Duration::from_secs(30),
            keep_count: 10,
        }
    }
}

/// One on-disk snapshot: every room, plus when it was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub rooms: Vec<RoomModel>,
}

/// Saves a snapshot of all rooms. Storage failures are logged and
/// swallowed; snapshotting must never interfere with gameplay.
pub fn save_snapshot(config: &SnapshotConfig, rooms: &[RoomModel]) {
    if rooms.is_empty() {
        return;
    }

    match write_snapshot(config, rooms) {
        Ok(path) => {
            debug!(path = %path.display(), room_count = rooms.len(), "Snapshot saved");
            prune_old_snapshots(config);
        }
        Err(e) => {
            error!(error = %e, "Failed to save snapshot");
        }
    }
}

fn write_snapshot(config: &SnapshotConfig, rooms: &[RoomModel]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(&config.state_dir)?;

    let timestamp = Utc::now();
    let filename = format!("game-state-{}.json", timestamp.timestamp_millis());
    let path = config.state_dir.join(filename);

    let snapshot = Snapshot {
        timestamp,
        rooms: rooms.to_vec(),
    };
    let data = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&path, data)?;
    Ok(path)
}

/// Loads the most recent snapshot, if any. Unreadable or corrupt files
/// are logged and skipped.
pub fn load_latest_snapshot(config: &SnapshotConfig) -> Option<Snapshot> {
    let mut files = snapshot_files(&config.state_dir);
    files.sort();
    files.reverse();

    for path in files {
        match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Snapshot>(&data) {
                Ok(snapshot) => {
                    info!(
                        path = %path.display(),
                        room_count = snapshot.rooms.len(),
                        "Loaded snapshot"
                    );
                    return Some(snapshot);
                }
                Err(e) => error!(path = %path.display(), error = %e, "Corrupt snapshot"),
            },
            Err(e) => error!(path = %path.display(), error = %e, "Failed to read snapshot"),
        }
    }
    None
}

/// Deletes old snapshot files beyond the configured retention count.
fn prune_old_snapshots(config: &SnapshotConfig) {
    let mut files = snapshot_files(&config.state_dir);
    files.sort();
    files.reverse();

    for path in files.into_iter().skip(config.keep_count) {
        if let Err(e) = fs::remove_file(&path) {
            error!(path = %path.display(), error = %e, "Failed to prune snapshot");
        }
    }
}

fn snapshot_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("game-state-") && n.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect()
}

/// Background task taking a snapshot of all rooms on an interval.
#[instrument(skip(registry))]
pub async fn start_snapshot_task(registry: Arc<RoomRegistry>, config: SnapshotConfig) {
    info!(
        snapshot_interval_secs = config.snapshot_interval.as_secs(),
        state_dir = %config.state_dir.display(),
        "Starting snapshot background task"
    );

    let mut snapshot_interval = interval(config.snapshot_interval);

    loop {
        snapshot_interval.tick().await;
        let rooms = registry.list_rooms().await;
        save_snapshot(&config, &rooms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> SnapshotConfig {
        SnapshotConfig {
            state_dir: dir.to_path_buf(),
            ..SnapshotConfig::default()
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let rooms = vec![RoomModel::new(
            "AB3K".to_string(),
            "host".to_string(),
            "Alice".to_string(),
        )];
        save_snapshot(&config, &rooms);

        let snapshot = load_latest_snapshot(&config).unwrap();
        assert_eq!(snapshot.rooms.len(), 1);
        assert_eq!(snapshot.rooms[0].code, "AB3K");
        assert_eq!(snapshot.rooms[0].players[0].name, "Alice");
    }

    #[test]
    fn test_empty_room_list_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        save_snapshot(&config, &[]);
        assert!(load_latest_snapshot(&config).is_none());
        assert!(snapshot_files(dir.path()).is_empty());
    }

    #[test]
    fn test_load_with_no_state_dir() {
        let config = test_config(Path::new("does-not-exist"));
        assert!(load_latest_snapshot(&config).is_none());
    }

    #[test]
    fn test_prune_keeps_most_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.keep_count = 3;

        // Distinct filenames with ascending timestamps
        for i in 0..6 {
            let path = dir.path().join(format!("game-state-{}.json", 1000 + i));
            let snapshot = Snapshot {
                timestamp: Utc::now(),
                rooms: vec![],
            };
            fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();
        }

        prune_old_snapshots(&config);

        let mut remaining = snapshot_files(dir.path());
        remaining.sort();
        assert_eq!(remaining.len(), 3);
        assert!(remaining[0].ends_with("game-state-1003.json"));
    }

    #[test]
    fn test_corrupt_snapshot_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let rooms = vec![RoomModel::new(
            "AB3K".to_string(),
            "host".to_string(),
            "Alice".to_string(),
        )];
        save_snapshot(&config, &rooms);

        // A later, corrupt file must not shadow the good one
        fs::write(dir.path().join("game-state-99999999999999.json"), "{oops").unwrap();

        let snapshot = load_latest_snapshot(&config).unwrap();
        assert_eq!(snapshot.rooms.len(), 1);
    }
}
