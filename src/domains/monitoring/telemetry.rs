use crate::common::DomainResult;
use crate::domains::dispatch::aggregate::plan::RoutePlan;
use crate::domains::dispatch::aggregate::types::GeoPoint;
use crate::domains::hos::HosState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One facet of a telemetry snapshot. A failed or timed-out fetch degrades
/// the facet to `Unavailable`; it never fails the whole tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sampled<T> {
    Value(T),
    Unavailable,
}

impl<T> Sampled<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Sampled::Value(v) => Some(v),
            Sampled::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Sampled::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverTelemetry {
    pub position: GeoPoint,
    /// Progress along the planned route, in miles from departure
    pub route_mile: f64,
    pub off_route_miles: f64,
    pub minutes_stationary: f64,
    pub currently_driving: bool,
    /// Clock state as logged by the ELD, not as planned
    pub hos: HosState,
    pub vehicle_fault: Option<String>,
    pub customer_requests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockStatus {
    pub stop_id: String,
    pub arrived_at: DateTime<Utc>,
    pub estimated_hours: f64,
    pub hours_on_dock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherNotice {
    pub description: String,
    pub severe: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStatus {
    pub delay_minutes: f64,
    pub eta: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelReading {
    pub gallons: f64,
    pub price_per_gallon: Option<f64>,
}

#[async_trait]
pub trait TelemetryFeed: Send + Sync {
    async fn sample(&self, plan: &RoutePlan) -> DomainResult<DriverTelemetry>;
}

#[async_trait]
pub trait DockStatusFeed: Send + Sync {
    async fn dock_status(&self, plan_id: &str) -> DomainResult<Option<DockStatus>>;
}

#[async_trait]
pub trait WeatherFeed: Send + Sync {
    async fn route_notices(&self, plan_id: &str) -> DomainResult<Vec<WeatherNotice>>;
}

#[async_trait]
pub trait TrafficFeed: Send + Sync {
    async fn conditions(&self, plan_id: &str) -> DomainResult<TrafficStatus>;
}

#[async_trait]
pub trait FuelFeed: Send + Sync {
    async fn reading(&self, vehicle_id: &str) -> DomainResult<FuelReading>;
}

#[derive(Clone)]
pub struct MonitorFeeds {
    pub telemetry: Arc<dyn TelemetryFeed>,
    pub dock: Arc<dyn DockStatusFeed>,
    pub weather: Arc<dyn WeatherFeed>,
    pub traffic: Arc<dyn TrafficFeed>,
    pub fuel: Arc<dyn FuelFeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub taken_at: DateTime<Utc>,
    pub telemetry: Sampled<DriverTelemetry>,
    pub dock: Sampled<Option<DockStatus>>,
    pub weather: Sampled<Vec<WeatherNotice>>,
    pub traffic: Sampled<TrafficStatus>,
    pub fuel: Sampled<FuelReading>,
}

/// Fetch all facets for one plan. Fetches run concurrently, each under its
/// own timeout, and fail independently.
pub async fn gather_snapshot(
    feeds: &MonitorFeeds,
    plan: &RoutePlan,
    fetch_timeout: Duration,
) -> TelemetrySnapshot {
    let (telemetry, dock, weather, traffic, fuel) = tokio::join!(
        facet(feeds.telemetry.sample(plan), fetch_timeout),
        facet(feeds.dock.dock_status(&plan.id), fetch_timeout),
        facet(feeds.weather.route_notices(&plan.id), fetch_timeout),
        facet(feeds.traffic.conditions(&plan.id), fetch_timeout),
        facet(feeds.fuel.reading(&plan.vehicle_id), fetch_timeout),
    );

    TelemetrySnapshot {
        taken_at: Utc::now(),
        telemetry,
        dock,
        weather,
        traffic,
        fuel,
    }
}

async fn facet<T>(
    fetch: impl std::future::Future<Output = DomainResult<T>>,
    timeout: Duration,
) -> Sampled<T> {
    match tokio::time::timeout(timeout, fetch).await {
        Ok(Ok(value)) => Sampled::Value(value),
        _ => Sampled::Unavailable,
    }
}
