use crate::common::{
    AggregateRoot, ApplicationError, ApplicationResult, DomainError, EventEnvelope, EventMetadata,
    EventStore, Snapshot, SnapshotStore,
};
use crate::domains::dispatch::active::ActivePlanRegistry;
use crate::domains::dispatch::aggregate::plan::{PlanStatus, RoutePlan};
use crate::domains::dispatch::aggregate::planner::{fuel, Dispatcher, PlannerConfig};
use crate::domains::dispatch::aggregate::types::PlanRequest;
use crate::domains::dispatch::ports::{FuelPriceProvider, RoutingProvider, WeatherProvider};
use crate::domains::dispatch::projections::DispatchBoardProjection;
use crate::domains::monitoring::triggers::Alert;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

struct ServiceState {
    dispatcher: Dispatcher,
    committed_version: u64,
}

/// Application-level facade over the dispatch aggregate: runs commands,
/// appends the resulting events, keeps the active-plan registry in step,
/// and snapshots periodically.
pub struct DispatchPlanningService {
    event_store: Arc<dyn EventStore + Send + Sync>,
    snapshot_store: Arc<dyn SnapshotStore + Send + Sync>,
    registry: Arc<ActivePlanRegistry>,
    routing: Arc<dyn RoutingProvider>,
    fuel_prices: Arc<dyn FuelPriceProvider>,
    weather: Arc<dyn WeatherProvider>,
    state: RwLock<ServiceState>,
    snapshot_frequency: u64,
}

impl DispatchPlanningService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dispatcher_id: String,
        config: PlannerConfig,
        event_store: Arc<dyn EventStore + Send + Sync>,
        snapshot_store: Arc<dyn SnapshotStore + Send + Sync>,
        registry: Arc<ActivePlanRegistry>,
        routing: Arc<dyn RoutingProvider>,
        fuel_prices: Arc<dyn FuelPriceProvider>,
        weather: Arc<dyn WeatherProvider>,
        snapshot_frequency: u64,
    ) -> Self {
        Self {
            event_store,
            snapshot_store,
            registry,
            routing,
            fuel_prices,
            weather,
            state: RwLock::new(ServiceState {
                dispatcher: Dispatcher::new(dispatcher_id, config),
                committed_version: 0,
            }),
            snapshot_frequency: snapshot_frequency.max(1),
        }
    }

    pub async fn generate_plan(&self, request: PlanRequest) -> ApplicationResult<RoutePlan> {
        let mut state = self.state.write().await;
        let plan_id = state
            .dispatcher
            .generate_plan(request, &*self.routing, &*self.fuel_prices, &*self.weather)?;
        self.commit(&mut state).await?;

        let plan = state
            .dispatcher
            .plan(&plan_id)
            .cloned()
            .ok_or(ApplicationError::Domain(DomainError::AggregateNotFound {
                id: plan_id,
            }))?;
        if plan.is_feasible {
            let stops = fuel::stations_used(&plan.segments);
            info!(
                plan_id = %plan.id,
                driver = %plan.driver_id,
                fuel_stops = stops.len(),
                "plan generated"
            );
        } else {
            warn!(
                plan_id = %plan.id,
                issues = plan.feasibility_issues.len(),
                "plan generated infeasible; left in draft for correction"
            );
        }
        Ok(plan)
    }

    /// Activate a plan, atomically superseding the driver's prior active
    /// plan. The registry compare-and-swap runs first: on conflict nothing
    /// changes anywhere (old plan active, new plan draft).
    pub async fn activate(&self, plan_id: &str) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        let driver_id = state
            .dispatcher
            .plan(plan_id)
            .ok_or(ApplicationError::Domain(DomainError::AggregateNotFound {
                id: plan_id.to_string(),
            }))?
            .driver_id
            .clone();
        let prior = state.dispatcher.active_plan_by_driver.get(&driver_id).cloned();

        self.registry
            .compare_and_activate(&driver_id, prior.as_deref(), plan_id)
            .map_err(|reason| {
                ApplicationError::Domain(DomainError::InvalidCommand {
                    reason: format!("activation conflict: {}", reason),
                })
            })?;

        if let Err(e) = state.dispatcher.activate_plan(plan_id) {
            // Undo the registry swap; the command never took effect.
            match prior {
                Some(ref p) => {
                    let _ = self.registry.compare_and_activate(&driver_id, Some(plan_id), p);
                }
                None => {
                    self.registry.deactivate(&driver_id, plan_id);
                }
            }
            return Err(e.into());
        }

        self.commit(&mut state).await?;
        info!(plan_id, driver = %driver_id, "plan activated");
        Ok(())
    }

    pub async fn cancel(&self, plan_id: &str) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        let was_active = state
            .dispatcher
            .plan(plan_id)
            .map(|p| (p.status == PlanStatus::Active, p.driver_id.clone()));
        state.dispatcher.cancel_plan(plan_id)?;
        if let Some((true, driver_id)) = was_active {
            self.registry.deactivate(&driver_id, plan_id);
        }
        self.commit(&mut state).await?;
        info!(plan_id, "plan cancelled");
        Ok(())
    }

    pub async fn complete(&self, plan_id: &str, now: DateTime<Utc>) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        let driver_id = state
            .dispatcher
            .plan(plan_id)
            .map(|p| p.driver_id.clone());
        state.dispatcher.complete_plan(plan_id, now)?;
        if let Some(driver_id) = driver_id {
            self.registry.deactivate(&driver_id, plan_id);
        }
        self.commit(&mut state).await?;
        info!(plan_id, "plan completed");
        Ok(())
    }

    pub async fn raise_alert(&self, alert: Alert) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        state.dispatcher.raise_alert(alert)?;
        self.commit(&mut state).await
    }

    pub async fn acknowledge_alert(&self, alert_id: Uuid) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        state.dispatcher.acknowledge_alert(alert_id)?;
        self.commit(&mut state).await
    }

    pub async fn resolve_alert(&self, alert_id: Uuid) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        state.dispatcher.resolve_alert(alert_id)?;
        self.commit(&mut state).await
    }

    pub async fn get_plan(&self, plan_id: &str) -> Option<RoutePlan> {
        self.state.read().await.dispatcher.plan(plan_id).cloned()
    }

    pub async fn active_plan_for(&self, driver_id: &str) -> Option<RoutePlan> {
        self.state
            .read()
            .await
            .dispatcher
            .active_plan_for(driver_id)
            .cloned()
    }

    pub async fn open_alerts(&self) -> Vec<Alert> {
        self.state
            .read()
            .await
            .dispatcher
            .alerts
            .iter()
            .filter(|a| a.is_open())
            .cloned()
            .collect()
    }

    /// Fold the full event history into board counters.
    pub async fn board_projection(&self) -> ApplicationResult<DispatchBoardProjection> {
        let state = self.state.read().await;
        let envelopes = self
            .event_store
            .load_events(state.dispatcher.aggregate_id(), 0)
            .await
            .map_err(ApplicationError::EventStore)?;
        let mut projection =
            DispatchBoardProjection::new(state.dispatcher.aggregate_id().to_string());
        for envelope in &envelopes {
            projection.apply_envelope(envelope);
        }
        Ok(projection)
    }

    async fn commit(&self, state: &mut ServiceState) -> ApplicationResult<()> {
        let events = state.dispatcher.uncommitted_events().to_vec();
        if events.is_empty() {
            return Ok(());
        }

        let metadata = EventMetadata {
            correlation_id: None,
            causation_id: None,
            user_id: None,
            source: "linehaul-app".to_string(),
        };
        let envelopes = events
            .iter()
            .map(|e| EventEnvelope::new(e, "Dispatcher", metadata.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DomainError::from)?;

        self.event_store
            .append_events(
                state.dispatcher.aggregate_id(),
                state.committed_version,
                envelopes,
            )
            .await
            .map_err(ApplicationError::EventStore)?;

        let before = state.committed_version;
        state.committed_version += events.len() as u64;
        state.dispatcher.mark_events_as_committed();

        if state.committed_version / self.snapshot_frequency > before / self.snapshot_frequency {
            let snapshot = Snapshot::new(
                state.dispatcher.aggregate_id(),
                "Dispatcher",
                state.committed_version,
                &state.dispatcher,
            )
            .map_err(DomainError::from)?;
            self.snapshot_store
                .save_snapshot(snapshot)
                .await
                .map_err(ApplicationError::SnapshotStore)?;
        }
        Ok(())
    }
}
