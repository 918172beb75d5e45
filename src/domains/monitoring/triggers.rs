use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCategory {
    Proactive,
    Reactive,
    Operational,
    External,
    Compliance,
}

/// The full deviation catalog: 14 trigger types across 5 categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    // proactive
    HosApproachingLimit,
    AppointmentRisk,
    // reactive
    HosViolation,
    DriverNotMoving,
    VehicleIssue,
    // operational
    DockDelay,
    FuelLow,
    RouteDeviation,
    EtaChange,
    // external
    WeatherAlert,
    TrafficDelay,
    CustomerRequest,
    // compliance
    RestStopSkipped,
    BreakComplianceShortfall,
}

impl TriggerType {
    pub fn category(&self) -> TriggerCategory {
        match self {
            TriggerType::HosApproachingLimit | TriggerType::AppointmentRisk => {
                TriggerCategory::Proactive
            }
            TriggerType::HosViolation
            | TriggerType::DriverNotMoving
            | TriggerType::VehicleIssue => TriggerCategory::Reactive,
            TriggerType::DockDelay
            | TriggerType::FuelLow
            | TriggerType::RouteDeviation
            | TriggerType::EtaChange => TriggerCategory::Operational,
            TriggerType::WeatherAlert
            | TriggerType::TrafficDelay
            | TriggerType::CustomerRequest => TriggerCategory::External,
            TriggerType::RestStopSkipped | TriggerType::BreakComplianceShortfall => {
                TriggerCategory::Compliance
            }
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            TriggerType::HosViolation | TriggerType::RestStopSkipped => Severity::Critical,
            TriggerType::HosApproachingLimit
            | TriggerType::AppointmentRisk
            | TriggerType::DriverNotMoving
            | TriggerType::VehicleIssue
            | TriggerType::DockDelay
            | TriggerType::FuelLow
            | TriggerType::WeatherAlert
            | TriggerType::BreakComplianceShortfall => Severity::Warning,
            TriggerType::RouteDeviation
            | TriggerType::EtaChange
            | TriggerType::TrafficDelay
            | TriggerType::CustomerRequest => Severity::Info,
        }
    }

    /// Whether the orchestrator should be told a re-plan is worth it. The
    /// recommendation is a distinct, explicitly-invoked action; nothing
    /// mutates the plan automatically.
    pub fn recommends_replan(&self) -> bool {
        matches!(self, TriggerType::HosViolation | TriggerType::RestStopSkipped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TriggerType::HosApproachingLimit => "hos_approaching_limit",
            TriggerType::AppointmentRisk => "appointment_risk",
            TriggerType::HosViolation => "hos_violation",
            TriggerType::DriverNotMoving => "driver_not_moving",
            TriggerType::VehicleIssue => "vehicle_issue",
            TriggerType::DockDelay => "dock_delay",
            TriggerType::FuelLow => "fuel_low",
            TriggerType::RouteDeviation => "route_deviation",
            TriggerType::EtaChange => "eta_change",
            TriggerType::WeatherAlert => "weather_alert",
            TriggerType::TrafficDelay => "traffic_delay",
            TriggerType::CustomerRequest => "customer_request",
            TriggerType::RestStopSkipped => "rest_stop_skipped",
            TriggerType::BreakComplianceShortfall => "break_compliance_shortfall",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A detected condition. Transient: triggers are recomputed every tick and
/// deduplicated before anything durable is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: Uuid,
    pub trigger_type: TriggerType,
    pub category: TriggerCategory,
    pub severity: Severity,
    pub plan_id: String,
    pub observed_at: DateTime<Utc>,
    pub evidence: String,
}

impl Trigger {
    pub fn new(
        trigger_type: TriggerType,
        plan_id: &str,
        observed_at: DateTime<Utc>,
        evidence: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_type,
            category: trigger_type.category(),
            severity: trigger_type.default_severity(),
            plan_id: plan_id.to_string(),
            observed_at,
            evidence,
        }
    }
}

/// Durable, dispatcher/driver-visible projection of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub plan_id: String,
    pub trigger_type: TriggerType,
    pub category: TriggerCategory,
    pub severity: Severity,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    /// First observation of the underlying condition; part of the dedup key
    pub open_since: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn from_trigger(trigger: &Trigger, open_since: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id: trigger.plan_id.clone(),
            trigger_type: trigger.trigger_type,
            category: trigger.category,
            severity: trigger.severity,
            message: trigger.evidence.clone(),
            raised_at: trigger.observed_at,
            open_since,
            acknowledged: false,
            resolved_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}
