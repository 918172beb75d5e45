use crate::common::{ApplicationError, ApplicationResult, DomainError};
use crate::domains::dispatch::aggregate::plan::{PlanStatus, RoutePlan};
use crate::domains::monitoring::scheduler::MonitorScheduler;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Owns the monitoring loop's lifecycle: starts the tick task, registers
/// and tears down plan subscriptions, and shuts the loop down cleanly.
pub struct MonitoringService {
    scheduler: Arc<MonitorScheduler>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MonitoringService {
    pub fn new(scheduler: Arc<MonitorScheduler>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            scheduler,
            shutdown_tx,
            shutdown_rx,
            handle: Mutex::new(None),
        }
    }

    pub fn scheduler(&self) -> Arc<MonitorScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return;
        }
        let scheduler = Arc::clone(&self.scheduler);
        let shutdown = self.shutdown_rx.clone();
        *handle = Some(tokio::spawn(scheduler.run(shutdown)));
    }

    /// Subscribe a plan to monitoring. Only active plans are watched.
    pub async fn watch_plan(&self, plan: RoutePlan) -> ApplicationResult<()> {
        if plan.status != PlanStatus::Active {
            return Err(ApplicationError::Domain(DomainError::InvalidCommand {
                reason: format!("plan {} is {:?}, only active plans are monitored", plan.id, plan.status),
            }));
        }
        self.scheduler.watch_plan(plan).await;
        Ok(())
    }

    pub async fn unwatch_plan(&self, plan_id: &str) {
        self.scheduler.unwatch_plan(plan_id).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = handle.await;
        }
    }
}
