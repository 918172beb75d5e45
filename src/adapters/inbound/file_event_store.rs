use crate::common::{EventEnvelope, EventStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// File-based EventStore implementation for development and the monitor
/// daemon.
///
/// Events are stored in JSON Lines format, one file per aggregate, so the
/// planning process and the daemon can share a store through the filesystem.
pub struct FileEventStore {
    base_path: PathBuf,
}

impl FileEventStore {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn file_path(&self, aggregate_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", aggregate_id))
    }

    async fn ensure_base_dir(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create event store directory: {}", e))
    }

    async fn read_all(&self, aggregate_id: &str) -> Result<Vec<EventEnvelope>, String> {
        let path = self.file_path(aggregate_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&path)
            .await
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read event line: {}", e))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let envelope: EventEnvelope = serde_json::from_str(&line)
                .map_err(|e| format!("Corrupt event line in {}: {}", path.display(), e))?;
            events.push(envelope);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: Vec<EventEnvelope>,
    ) -> Result<(), String> {
        self.ensure_base_dir().await?;

        let current = self.read_all(aggregate_id).await?;
        if current.len() as u64 != expected_version {
            return Err(format!(
                "Version mismatch: expected {}, got {}",
                expected_version,
                current.len()
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_path(aggregate_id))
            .await
            .map_err(|e| format!("Failed to open event file: {}", e))?;

        for envelope in &events {
            let line = serde_json::to_string(envelope)
                .map_err(|e| format!("Failed to serialize event: {}", e))?;
            file.write_all(line.as_bytes())
                .await
                .map_err(|e| format!("Failed to write event: {}", e))?;
            file.write_all(b"\n")
                .await
                .map_err(|e| format!("Failed to write event: {}", e))?;
        }
        file.flush()
            .await
            .map_err(|e| format!("Failed to flush events: {}", e))?;
        Ok(())
    }

    async fn load_events(
        &self,
        aggregate_id: &str,
        from_version: u64,
    ) -> Result<Vec<EventEnvelope>, String> {
        let events = self.read_all(aggregate_id).await?;
        Ok(events.into_iter().skip(from_version as usize).collect())
    }

    async fn load_events_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        let mut matching = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.base_path).await {
            Ok(dir) => dir,
            Err(_) => return Ok(Vec::new()),
        };
        while let Ok(Some(entry)) = dir.next_entry().await {
            let path = entry.path();
            if path.extension().map(|e| e == "jsonl").unwrap_or(false) {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                for envelope in self.read_all(&stem).await? {
                    if envelope.event_type == event_type
                        && from_timestamp.map(|t| envelope.occurred_at >= t).unwrap_or(true)
                    {
                        matching.push(envelope);
                    }
                }
            }
        }
        matching.sort_by_key(|e| e.occurred_at);
        Ok(matching)
    }
}
