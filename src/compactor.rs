use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::Engine;

const CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that rewrites the WAL once enough appends pile up.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(CHECK_INTERVAL);
    loop {
        interval.tick().await;
        compact_if_needed(&engine, threshold).await;
    }
}

/// Compact when appends since the last compaction exceed `threshold`.
/// Returns whether a compaction ran.
pub async fn compact_if_needed(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_compact().await;
    if appends <= threshold {
        return false;
    }
    match engine.compact_wal().await {
        Ok(()) => {
            info!("compacted WAL after {appends} appends");
            true
        }
        Err(e) => {
            // Retried on the next tick.
            warn!("WAL compaction failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("innkeep_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let path = test_wal_path("threshold.wal");
        let engine = Engine::new(path).unwrap();
        engine.register_hotel(hotel_h()).await.unwrap();
        engine.register_hotel(hotel("B", vec![room("Twin", 90, Some(4), 2)])).await.unwrap();

        assert!(!compact_if_needed(&engine, 2).await);
        assert_eq!(engine.wal_appends_since_compact().await, 2);

        engine.register_hotel(hotel_h()).await.unwrap();
        assert!(compact_if_needed(&engine, 2).await);
        assert_eq!(engine.wal_appends_since_compact().await, 0);
        assert_eq!(engine.hotel_count(), 2);
    }

    #[tokio::test]
    async fn failed_compaction_reports_false_and_keeps_count() {
        let dir = std::env::temp_dir().join("innkeep_test_compactor_gone");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let engine = Engine::new(dir.join("gone.wal")).unwrap();
        for _ in 0..3 {
            engine.register_hotel(hotel_h()).await.unwrap();
        }

        // No directory left to write the snapshot into.
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(!compact_if_needed(&engine, 2).await);
        assert_eq!(engine.wal_appends_since_compact().await, 3);
    }
}
