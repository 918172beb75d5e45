//! Fixture-backed planning providers. Production deployments swap these for
//! adapters over the real routing, fuel-price and weather collaborators;
//! the binaries and tests run against these.

use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::types::GeoPoint;
use crate::domains::dispatch::ports::{
    FuelPriceProvider, FuelStation, LegEstimate, RoutingProvider, WeatherProvider,
};
use std::sync::RwLock;

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Great-circle distance inflated by a road-shape factor, at a flat
/// average speed. Deterministic, so plan generation is reproducible.
pub struct StaticRoutingProvider {
    pub road_factor: f64,
    pub average_mph: f64,
}

impl StaticRoutingProvider {
    pub fn new() -> Self {
        Self {
            road_factor: 1.17,
            average_mph: 52.0,
        }
    }
}

impl Default for StaticRoutingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingProvider for StaticRoutingProvider {
    fn estimate_leg(&self, from: &GeoPoint, to: &GeoPoint) -> DomainResult<LegEstimate> {
        let distance_miles = haversine_miles(from, to) * self.road_factor;
        Ok(LegEstimate {
            distance_miles,
            drive_hours: distance_miles / self.average_mph,
        })
    }
}

pub fn haversine_miles(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Serves a fixed station list. `set_available(false)` simulates a feed
/// outage so degradation paths can be exercised.
pub struct StaticFuelPriceProvider {
    stations: RwLock<Vec<FuelStation>>,
    available: RwLock<bool>,
}

impl StaticFuelPriceProvider {
    pub fn new(stations: Vec<FuelStation>) -> Self {
        Self {
            stations: RwLock::new(stations),
            available: RwLock::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        *self.available.write().expect("fuel provider poisoned") = available;
    }

    pub fn set_stations(&self, stations: Vec<FuelStation>) {
        *self.stations.write().expect("fuel provider poisoned") = stations;
    }
}

impl FuelPriceProvider for StaticFuelPriceProvider {
    fn stations_along(&self, route_miles: f64) -> DomainResult<Vec<FuelStation>> {
        if !*self.available.read().expect("fuel provider poisoned") {
            return Err(DomainError::InfrastructureError(
                "fuel price feed unavailable".to_string(),
            ));
        }
        Ok(self
            .stations
            .read()
            .expect("fuel provider poisoned")
            .iter()
            .filter(|s| s.route_mile <= route_miles)
            .cloned()
            .collect())
    }
}

/// Fixed route-level weather advisories.
pub struct StaticWeatherProvider {
    alerts: RwLock<Vec<String>>,
    available: RwLock<bool>,
}

impl StaticWeatherProvider {
    pub fn new(alerts: Vec<String>) -> Self {
        Self {
            alerts: RwLock::new(alerts),
            available: RwLock::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        *self.available.write().expect("weather provider poisoned") = available;
    }
}

impl WeatherProvider for StaticWeatherProvider {
    fn route_alerts(&self, _from: &GeoPoint, _to: &GeoPoint) -> DomainResult<Vec<String>> {
        if !*self.available.read().expect("weather provider poisoned") {
            return Err(DomainError::InfrastructureError(
                "weather feed unavailable".to_string(),
            ));
        }
        Ok(self.alerts.read().expect("weather provider poisoned").clone())
    }
}
