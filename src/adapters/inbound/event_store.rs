use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory event store implementation for testing and development
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    pub async fn event_count(&self, aggregate_id: &str) -> usize {
        self.events
            .read()
            .await
            .get(aggregate_id)
            .map(|e| e.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        let mut store = self.events.write().await;
        let aggregate_events = store.entry(aggregate_id.to_string()).or_default();

        // Optimistic concurrency: the caller states the version it built on.
        let current_version = aggregate_events.len() as u64;
        if current_version != expected_version {
            return Err(format!(
                "Version mismatch: expected {}, got {}",
                expected_version, current_version
            ));
        }

        aggregate_events.extend(events);
        Ok(())
    }

    async fn load_events(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;
        Ok(store
            .get(aggregate_id)
            .map(|events| events.iter().skip(from_version as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        let store = self.events.read().await;
        let mut matching: Vec<EventEnvelope> = store
            .values()
            .flatten()
            .filter(|e| e.event_type == event_type)
            .filter(|e| from_timestamp.map(|t| e.occurred_at >= t).unwrap_or(true))
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.occurred_at);
        Ok(matching)
    }
}
