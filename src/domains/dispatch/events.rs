use crate::common::DomainEvent;
use crate::domains::dispatch::aggregate::plan::RoutePlan;
use crate::domains::monitoring::triggers::{Alert, TriggerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DispatchEvent {
    DispatcherCreated {
        dispatcher_id: String,
        timestamp: DateTime<Utc>,
    },
    PlanGenerated {
        dispatcher_id: String,
        plan: Box<RoutePlan>,
        timestamp: DateTime<Utc>,
    },
    PlanActivated {
        dispatcher_id: String,
        plan_id: String,
        driver_id: String,
        timestamp: DateTime<Utc>,
    },
    PlanDeactivated {
        dispatcher_id: String,
        plan_id: String,
        driver_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    PlanCancelled {
        dispatcher_id: String,
        plan_id: String,
        timestamp: DateTime<Utc>,
    },
    PlanCompleted {
        dispatcher_id: String,
        plan_id: String,
        timestamp: DateTime<Utc>,
    },
    ReplanRecommended {
        dispatcher_id: String,
        plan_id: String,
        trigger_type: TriggerType,
        timestamp: DateTime<Utc>,
    },
    AlertRaised {
        dispatcher_id: String,
        alert: Box<Alert>,
        timestamp: DateTime<Utc>,
    },
    AlertAcknowledged {
        dispatcher_id: String,
        alert_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    AlertResolved {
        dispatcher_id: String,
        alert_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for DispatchEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::DispatcherCreated { .. } => "DispatcherCreated",
            DispatchEvent::PlanGenerated { .. } => "PlanGenerated",
            DispatchEvent::PlanActivated { .. } => "PlanActivated",
            DispatchEvent::PlanDeactivated { .. } => "PlanDeactivated",
            DispatchEvent::PlanCancelled { .. } => "PlanCancelled",
            DispatchEvent::PlanCompleted { .. } => "PlanCompleted",
            DispatchEvent::ReplanRecommended { .. } => "ReplanRecommended",
            DispatchEvent::AlertRaised { .. } => "AlertRaised",
            DispatchEvent::AlertAcknowledged { .. } => "AlertAcknowledged",
            DispatchEvent::AlertResolved { .. } => "AlertResolved",
        }
    }

    fn aggregate_id(&self) -> &str {
        match self {
            DispatchEvent::DispatcherCreated { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::PlanGenerated { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::PlanActivated { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::PlanDeactivated { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::PlanCancelled { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::PlanCompleted { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::ReplanRecommended { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::AlertRaised { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::AlertAcknowledged { dispatcher_id, .. } => dispatcher_id,
            DispatchEvent::AlertResolved { dispatcher_id, .. } => dispatcher_id,
        }
    }

    fn event_version(&self) -> u64 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DispatchEvent::DispatcherCreated { timestamp, .. } => *timestamp,
            DispatchEvent::PlanGenerated { timestamp, .. } => *timestamp,
            DispatchEvent::PlanActivated { timestamp, .. } => *timestamp,
            DispatchEvent::PlanDeactivated { timestamp, .. } => *timestamp,
            DispatchEvent::PlanCancelled { timestamp, .. } => *timestamp,
            DispatchEvent::PlanCompleted { timestamp, .. } => *timestamp,
            DispatchEvent::ReplanRecommended { timestamp, .. } => *timestamp,
            DispatchEvent::AlertRaised { timestamp, .. } => *timestamp,
            DispatchEvent::AlertAcknowledged { timestamp, .. } => *timestamp,
            DispatchEvent::AlertResolved { timestamp, .. } => *timestamp,
        }
    }
}
