use super::segment::RouteSegment;
use super::types::{DispatcherParams, OptimizationPriority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub load_ids: Vec<String>,
    pub departure_time: DateTime<Utc>,
    pub estimated_arrival: DateTime<Utc>,
    pub total_distance_miles: f64,
    pub total_trip_hours: f64,
    pub total_driving_days: u32,
    pub total_cost_estimate: f64,
    pub priority: OptimizationPriority,
    pub params: DispatcherParams,
    pub is_feasible: bool,
    pub feasibility_issues: Vec<String>,
    pub status: PlanStatus,
    pub weather_alerts: Vec<String>,
    pub segments: Vec<RouteSegment>,
    pub created_at: DateTime<Utc>,
}

impl RoutePlan {
    /// Arrival of the final dock segment, used to decide completion.
    pub fn final_dock_arrival(&self) -> Option<DateTime<Utc>> {
        self.segments
            .iter()
            .rev()
            .find(|s| matches!(s.detail, super::segment::SegmentDetail::Dock { .. }))
            .map(|s| s.start)
    }
}
