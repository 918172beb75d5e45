//! The monitoring loop. One logical tick per interval; each tick spawns an
//! isolated evaluation task per watched plan so a slow external call for
//! one plan never delays alerts for another. Plans leaving Active are torn
//! down before the next tick; in-flight evaluations finish but their
//! results are discarded.

use crate::domains::dispatch::actors::DispatchCommandActor;
use crate::domains::dispatch::aggregate::plan::RoutePlan;
use crate::domains::logger::DynLogger;
use crate::domains::monitoring::dispatcher::AlertDispatcher;
use crate::domains::monitoring::evaluator::{evaluate, TriggerThresholds};
use crate::domains::monitoring::ledger::TriggerLedger;
use crate::domains::monitoring::telemetry::{gather_snapshot, MonitorFeeds};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinSet;

pub struct MonitorScheduler {
    feeds: MonitorFeeds,
    alert_dispatcher: Arc<AlertDispatcher>,
    command_actor: Arc<DispatchCommandActor>,
    dispatcher_id: String,
    thresholds: TriggerThresholds,
    tick_interval: Duration,
    fetch_timeout: Duration,
    watched: RwLock<HashMap<String, WatchedPlan>>,
    ledger: Mutex<TriggerLedger>,
    logger: DynLogger,
}

struct WatchedPlan {
    plan: Arc<RoutePlan>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl MonitorScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feeds: MonitorFeeds,
        alert_dispatcher: Arc<AlertDispatcher>,
        command_actor: Arc<DispatchCommandActor>,
        dispatcher_id: String,
        thresholds: TriggerThresholds,
        tick_interval: Duration,
        fetch_timeout: Duration,
        logger: DynLogger,
    ) -> Self {
        Self {
            feeds,
            alert_dispatcher,
            command_actor,
            dispatcher_id,
            thresholds,
            tick_interval,
            fetch_timeout,
            watched: RwLock::new(HashMap::new()),
            ledger: Mutex::new(TriggerLedger::new()),
            logger,
        }
    }

    /// Subscribe an active plan to the tick loop.
    pub async fn watch_plan(&self, plan: RoutePlan) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let plan_id = plan.id.clone();
        self.watched.write().await.insert(
            plan_id.clone(),
            WatchedPlan {
                plan: Arc::new(plan),
                cancel_tx,
                cancel_rx,
            },
        );
        self.logger.info(&format!("monitoring plan {}", plan_id));
    }

    /// Tear down a plan's subscription. In-flight evaluations observe the
    /// cancellation flag and discard their results.
    pub async fn unwatch_plan(&self, plan_id: &str) {
        if let Some(watched) = self.watched.write().await.remove(plan_id) {
            let _ = watched.cancel_tx.send(true);
        }
        self.ledger.lock().await.drop_plan(plan_id);
        self.logger
            .info(&format!("monitoring torn down for plan {}", plan_id));
    }

    pub async fn watched_count(&self) -> usize {
        self.watched.read().await.len()
    }

    /// Run one tick to completion: spawn per-plan tasks, await them all.
    pub async fn tick_once(self: &Arc<Self>) {
        let plans: Vec<(Arc<RoutePlan>, watch::Receiver<bool>)> = self
            .watched
            .read()
            .await
            .values()
            .map(|w| (w.plan.clone(), w.cancel_rx.clone()))
            .collect();

        let mut tasks = JoinSet::new();
        for (plan, cancel) in plans {
            let scheduler = Arc::clone(self);
            tasks.spawn(async move {
                scheduler.evaluate_plan(plan, cancel).await;
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    async fn evaluate_plan(self: Arc<Self>, plan: Arc<RoutePlan>, cancel: watch::Receiver<bool>) {
        let snapshot = gather_snapshot(&self.feeds, &plan, self.fetch_timeout).await;

        if *cancel.borrow() {
            self.logger.info(&format!(
                "discarding evaluation for plan {}: no longer active",
                plan.id
            ));
            return;
        }

        let now = Utc::now();
        let triggers = evaluate(&plan, &snapshot, now, &self.thresholds);
        let outcome = self.ledger.lock().await.reconcile(&plan.id, &triggers, now);

        for alert in outcome.new_alerts {
            if alert.trigger_type.recommends_replan() {
                if let Err(e) = self
                    .command_actor
                    .recommend_replan(
                        self.dispatcher_id.clone(),
                        plan.id.clone(),
                        alert.trigger_type,
                    )
                    .await
                {
                    self.logger
                        .warn(&format!("replan recommendation not sent: {}", e));
                }
            }
            let delivered = self.alert_dispatcher.dispatch(&alert).await;
            if !delivered {
                self.ledger
                    .lock()
                    .await
                    .forget(&plan.id, alert.trigger_type);
            }
        }

        for alert_id in outcome.resolved_alert_ids {
            self.logger
                .info(&format!("condition behind alert {} resolved", alert_id));
        }
    }

    /// The periodic loop. Ticks are skipped rather than bunched when the
    /// process stalls; the ledger keeps duplicated ticks idempotent anyway.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick_once().await;
                }
                _ = shutdown.changed() => {
                    self.logger.info("monitor scheduler shutting down");
                    break;
                }
            }
        }
    }
}
