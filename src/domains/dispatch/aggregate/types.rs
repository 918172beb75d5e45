use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopAction {
    Pickup,
    Delivery,
}

/// A single pickup or delivery appointment. Sequence is dispatcher-assigned;
/// the planner visits stops in sequence order and never resequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub sequence: u32,
    pub action: StopAction,
    pub address: String,
    pub location: GeoPoint,
    pub dock_estimate_hours: f64,
    /// Driver is logged off duty while the dock works the trailer
    /// (drop-and-wait appointments). Gates rest/break credit for dock time.
    pub off_duty_qualifying: bool,
    pub window: Option<TimeWindow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    pub commodity: String,
    pub weight_lbs: f64,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub name: String,
    /// Rolling 7/8-day on-duty hours from the ELD history at plan time.
    pub cycle_hours_used: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub tank_capacity_gal: f64,
    pub mpg: f64,
    pub current_fuel_gal: f64,
    pub current_location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationPriority {
    MinimizeTime,
    MinimizeCost,
    Balance,
}

/// Dispatcher preference for how required rest is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredRest {
    Auto,
    Full,
    Split8_2,
    Split7_3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherParams {
    pub preferred_rest_type: PreferredRest,
    pub avoid_toll_roads: bool,
    pub max_fuel_detour_miles: f64,
}

impl Default for DispatcherParams {
    fn default() -> Self {
        Self {
            preferred_rest_type: PreferredRest::Auto,
            avoid_toll_roads: false,
            max_fuel_detour_miles: 15.0,
        }
    }
}

/// Everything `Dispatcher::generate_plan` needs from the caller.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub loads: Vec<Load>,
    pub driver: Driver,
    pub vehicle: Vehicle,
    pub departure_time: DateTime<Utc>,
    pub priority: OptimizationPriority,
    pub params: DispatcherParams,
}
