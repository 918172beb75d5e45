use crate::domains::logger::DynLogger;
use crate::domains::monitoring::dispatcher::AlertSink;
use crate::domains::monitoring::triggers::Alert;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Buffers delivered alerts in memory. Can be told to fail the next N
/// deliveries so retry behavior can be exercised.
#[derive(Default)]
pub struct InMemoryAlertSink {
    delivered: Mutex<Vec<Alert>>,
    fail_next: AtomicU32,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<Alert> {
        self.delivered.lock().expect("alert sink poisoned").clone()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), String> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err("injected delivery failure".to_string());
        }
        self.delivered
            .lock()
            .expect("alert sink poisoned")
            .push(alert.clone());
        Ok(())
    }
}

/// Writes alerts to the domain logger; the delivery channel for the
/// daemon when no notification backend is wired up.
pub struct LoggingAlertSink {
    logger: DynLogger,
}

impl LoggingAlertSink {
    pub fn new(logger: DynLogger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl AlertSink for LoggingAlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<(), String> {
        self.logger.warn(&format!(
            "[{:?}/{:?}] plan {}: {}",
            alert.category, alert.severity, alert.plan_id, alert.message
        ));
        Ok(())
    }
}
