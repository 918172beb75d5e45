use crate::common::DomainResult;
use crate::domains::dispatch::aggregate::types::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegEstimate {
    pub distance_miles: f64,
    pub drive_hours: f64,
}

/// Port for the external routing/distance collaborator. Planning calls this
/// synchronously and fails fast when no estimate is available; a plan is
/// never generated from stale or default distances.
pub trait RoutingProvider: Send + Sync {
    fn estimate_leg(&self, from: &GeoPoint, to: &GeoPoint) -> DomainResult<LegEstimate>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStation {
    pub name: String,
    /// Position along the planned route, in miles from departure
    pub route_mile: f64,
    /// Added round-trip miles to reach the station and return to route
    pub detour_miles: f64,
    pub price_per_gallon: f64,
}

/// Port for the fuel-price feed consulted during planning.
pub trait FuelPriceProvider: Send + Sync {
    /// Stations purchasable along a route of the given total length,
    /// positioned by route mile.
    fn stations_along(&self, route_miles: f64) -> DomainResult<Vec<FuelStation>>;
}

/// Port for the weather collaborator consulted at plan-generation time.
pub trait WeatherProvider: Send + Sync {
    fn route_alerts(&self, from: &GeoPoint, to: &GeoPoint) -> DomainResult<Vec<String>>;
}

/// Port for loading dispatch fixtures (load sets, station tables) from
/// wherever the deployment keeps them. Implementations (adapters) provide
/// filesystem or network-backed sources.
pub trait DispatchDataSource: Send + Sync {
    fn load_loads(&self, name: &str) -> DomainResult<Vec<super::aggregate::types::Load>>;
    fn load_fuel_stations(&self, name: &str) -> DomainResult<Vec<FuelStation>>;
}
