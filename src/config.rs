use crate::domains::dispatch::aggregate::planner::PlannerConfig;
use crate::domains::monitoring::evaluator::TriggerThresholds;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dispatcher_id: String,
    pub planning: PlannerConfig,
    pub monitoring: MonitoringConfig,
    pub event_store: EventStoreConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub tick_seconds: u64,
    pub fetch_timeout_ms: u64,
    pub alert_retry_attempts: u32,
    pub alert_retry_base_ms: u64,
    pub thresholds: TriggerThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStoreConfig {
    pub snapshot_frequency: u64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub base_dir: Option<String>,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatcher_id: "dispatch-board".to_string(),
            planning: PlannerConfig::default(),
            monitoring: MonitoringConfig {
                tick_seconds: 60,
                fetch_timeout_ms: 5_000,
                alert_retry_attempts: 3,
                alert_retry_base_ms: 250,
                thresholds: TriggerThresholds::default(),
            },
            event_store: EventStoreConfig {
                snapshot_frequency: 100,
                batch_size: 50,
            },
            data: DataConfig { base_dir: None },
        }
    }
}
