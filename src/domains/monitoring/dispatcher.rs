use crate::domains::logger::DynLogger;
use crate::domains::monitoring::triggers::Alert;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Delivery port for dispatcher/driver-visible alerts. Implementations
/// push to notification channels, message buses or test buffers.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &Alert) -> Result<(), String>;
}

/// Delivers alerts with bounded retry. Failures are logged and retried,
/// never silently dropped; a condition whose alert could not be delivered
/// stays open and is re-raised on the next tick.
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    logger: DynLogger,
    max_attempts: u32,
    retry_base_ms: u64,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>, logger: DynLogger, max_attempts: u32, retry_base_ms: u64) -> Self {
        Self {
            sink,
            logger,
            max_attempts,
            retry_base_ms,
        }
    }

    pub async fn dispatch(&self, alert: &Alert) -> bool {
        for attempt in 1..=self.max_attempts.max(1) {
            match self.sink.deliver(alert).await {
                Ok(()) => {
                    self.logger.info(&format!(
                        "alert {} ({}) delivered for plan {}",
                        alert.id,
                        alert.trigger_type.name(),
                        alert.plan_id
                    ));
                    return true;
                }
                Err(e) => {
                    self.logger.warn(&format!(
                        "alert {} delivery attempt {}/{} failed: {}",
                        alert.id, attempt, self.max_attempts, e
                    ));
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }
        self.logger.error(&format!(
            "alert {} ({}) undelivered after {} attempts; condition stays open for the next tick",
            alert.id,
            alert.trigger_type.name(),
            self.max_attempts
        ));
        false
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_base_ms << (attempt - 1).min(6);
        let jitter = rand::thread_rng().gen_range(0..=self.retry_base_ms / 2 + 1);
        Duration::from_millis(base + jitter)
    }
}
