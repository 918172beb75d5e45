use super::planner::Dispatcher;
use crate::common::{AggregateRoot, DomainResult};
use crate::domains::dispatch::aggregate::plan::PlanStatus;
use crate::domains::dispatch::events::DispatchEvent;

impl AggregateRoot for Dispatcher {
    type Event = DispatchEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) -> DomainResult<()> {
        match event {
            DispatchEvent::DispatcherCreated { .. } => {}
            DispatchEvent::PlanGenerated { plan, .. } => {
                self.plans.push((**plan).clone());
            }
            DispatchEvent::PlanActivated {
                plan_id, driver_id, ..
            } => {
                if let Some(plan) = self.plans.iter_mut().find(|p| p.id == *plan_id) {
                    plan.status = PlanStatus::Active;
                }
                self.active_plan_by_driver
                    .insert(driver_id.clone(), plan_id.clone());
            }
            DispatchEvent::PlanDeactivated {
                plan_id, driver_id, ..
            } => {
                // A superseded plan is terminal; replanning creates a new one.
                if let Some(plan) = self.plans.iter_mut().find(|p| p.id == *plan_id) {
                    plan.status = PlanStatus::Cancelled;
                }
                if self.active_plan_by_driver.get(driver_id) == Some(plan_id) {
                    self.active_plan_by_driver.remove(driver_id);
                }
            }
            DispatchEvent::PlanCancelled { plan_id, .. } => {
                if let Some(plan) = self.plans.iter_mut().find(|p| p.id == *plan_id) {
                    plan.status = PlanStatus::Cancelled;
                    let driver_id = plan.driver_id.clone();
                    if self.active_plan_by_driver.get(&driver_id) == Some(plan_id) {
                        self.active_plan_by_driver.remove(&driver_id);
                    }
                }
            }
            DispatchEvent::PlanCompleted { plan_id, .. } => {
                if let Some(plan) = self.plans.iter_mut().find(|p| p.id == *plan_id) {
                    plan.status = PlanStatus::Completed;
                    let driver_id = plan.driver_id.clone();
                    if self.active_plan_by_driver.get(&driver_id) == Some(plan_id) {
                        self.active_plan_by_driver.remove(&driver_id);
                    }
                }
            }
            DispatchEvent::ReplanRecommended { .. } => {
                // Advisory only. Replanning is an explicit dispatcher action.
            }
            DispatchEvent::AlertRaised { alert, .. } => {
                self.alerts.push((**alert).clone());
            }
            DispatchEvent::AlertAcknowledged { alert_id, .. } => {
                if let Some(alert) = self.alerts.iter_mut().find(|a| a.id == *alert_id) {
                    alert.acknowledged = true;
                }
            }
            DispatchEvent::AlertResolved {
                alert_id,
                timestamp,
                ..
            } => {
                if let Some(alert) = self.alerts.iter_mut().find(|a| a.id == *alert_id) {
                    alert.resolved_at = Some(*timestamp);
                }
            }
        }
        self.version += 1;
        Ok(())
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        Dispatcher::uncommitted_events(self)
    }

    fn mark_events_as_committed(&mut self) {
        Dispatcher::mark_events_as_committed(self)
    }

    fn add_event(&mut self, event: Self::Event) {
        Dispatcher::add_event(self, event)
    }
}
