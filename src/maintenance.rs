use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::store::{Store, StoreError};

/// Background task that compacts the change log once enough appends have
/// piled up since the last compaction.
pub async fn run_compactor(store: Arc<Store>, threshold: u64, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match compact_if_needed(&store, threshold).await {
            Ok(true) => info!("periodic compaction done"),
            Ok(false) => {}
            Err(e) => warn!("compaction failed: {e}"),
        }
    }
}

/// One compactor tick. `Ok(true)` if the log was rewritten.
pub async fn compact_if_needed(store: &Store, threshold: u64) -> Result<bool, StoreError> {
    let appends = store.appends_since_compact().await;
    if appends < threshold {
        debug!(appends, threshold, "compaction not needed");
        return Ok(false);
    }
    store.compact().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutConfig;
    use crate::model::EventDraft;
    use crate::notify::ChangeHub;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use ulid::Ulid;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("daygrid_test_maintenance");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let path = test_wal_path("threshold.wal");
        let store = Store::open(path, Arc::new(ChangeHub::new()), LayoutConfig::default()).unwrap();

        let rid = Ulid::new();
        store.create_resource(rid, "Resource A".into()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for i in 0..4 {
            store
                .create_event(Ulid::new(), EventDraft::new(rid, format!("Job {i}"), day))
                .await
                .unwrap();
        }

        assert!(!compact_if_needed(&store, 10).await.unwrap());
        assert_eq!(store.appends_since_compact().await, 5);

        assert!(compact_if_needed(&store, 5).await.unwrap());
        assert_eq!(store.appends_since_compact().await, 0);
        assert_eq!(store.cell_events(rid, day).await.unwrap().len(), 4);
    }
}
