use crate::common::{Snapshot, SnapshotStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory snapshot store implementation for testing and development
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, Vec<Snapshot>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), String> {
        let mut store = self.snapshots.write().await;
        store
            .entry(snapshot.aggregate_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn load_snapshot(
        &self,
        aggregate_id: &str,
        max_version: Option<u64>,
    ) -> Result<Option<Snapshot>, String> {
        let store = self.snapshots.read().await;
        Ok(store.get(aggregate_id).and_then(|snapshots| {
            snapshots
                .iter()
                .filter(|s| max_version.map(|v| s.aggregate_version <= v).unwrap_or(true))
                .max_by_key(|s| s.aggregate_version)
                .cloned()
        }))
    }

    async fn delete_snapshots_before(
        &self,
        aggregate_id: &str,
        version: u64,
    ) -> Result<(), String> {
        let mut store = self.snapshots.write().await;
        if let Some(snapshots) = store.get_mut(aggregate_id) {
            snapshots.retain(|s| s.aggregate_version >= version);
        }
        Ok(())
    }
}
