//! Scripted monitoring feeds. Each adapter serves a mutable fixture value
//! and can be flipped unavailable to exercise per-facet degradation.

use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::plan::RoutePlan;
use crate::domains::monitoring::telemetry::{
    DockStatus, DockStatusFeed, DriverTelemetry, FuelFeed, FuelReading, TelemetryFeed,
    TrafficFeed, TrafficStatus, WeatherFeed, WeatherNotice,
};
use async_trait::async_trait;
use std::sync::RwLock;

fn unavailable(feed: &str) -> DomainError {
    DomainError::InfrastructureError(format!("{} feed unavailable", feed))
}

pub struct ScriptedTelemetryFeed {
    current: RwLock<Option<DriverTelemetry>>,
}

impl ScriptedTelemetryFeed {
    pub fn new(telemetry: DriverTelemetry) -> Self {
        Self {
            current: RwLock::new(Some(telemetry)),
        }
    }

    pub fn set(&self, telemetry: DriverTelemetry) {
        *self.current.write().expect("telemetry fixture poisoned") = Some(telemetry);
    }

    pub fn set_unavailable(&self) {
        *self.current.write().expect("telemetry fixture poisoned") = None;
    }
}

#[async_trait]
impl TelemetryFeed for ScriptedTelemetryFeed {
    async fn sample(&self, _plan: &RoutePlan) -> DomainResult<DriverTelemetry> {
        self.current
            .read()
            .expect("telemetry fixture poisoned")
            .clone()
            .ok_or_else(|| unavailable("telemetry"))
    }
}

pub struct ScriptedDockFeed {
    current: RwLock<Option<Option<DockStatus>>>,
}

impl ScriptedDockFeed {
    pub fn new(status: Option<DockStatus>) -> Self {
        Self {
            current: RwLock::new(Some(status)),
        }
    }

    pub fn set(&self, status: Option<DockStatus>) {
        *self.current.write().expect("dock fixture poisoned") = Some(status);
    }

    pub fn set_unavailable(&self) {
        *self.current.write().expect("dock fixture poisoned") = None;
    }
}

#[async_trait]
impl DockStatusFeed for ScriptedDockFeed {
    async fn dock_status(&self, _plan_id: &str) -> DomainResult<Option<DockStatus>> {
        self.current
            .read()
            .expect("dock fixture poisoned")
            .clone()
            .ok_or_else(|| unavailable("dock status"))
    }
}

pub struct ScriptedWeatherFeed {
    current: RwLock<Option<Vec<WeatherNotice>>>,
}

impl ScriptedWeatherFeed {
    pub fn new(notices: Vec<WeatherNotice>) -> Self {
        Self {
            current: RwLock::new(Some(notices)),
        }
    }

    pub fn set(&self, notices: Vec<WeatherNotice>) {
        *self.current.write().expect("weather fixture poisoned") = Some(notices);
    }

    pub fn set_unavailable(&self) {
        *self.current.write().expect("weather fixture poisoned") = None;
    }
}

#[async_trait]
impl WeatherFeed for ScriptedWeatherFeed {
    async fn route_notices(&self, _plan_id: &str) -> DomainResult<Vec<WeatherNotice>> {
        self.current
            .read()
            .expect("weather fixture poisoned")
            .clone()
            .ok_or_else(|| unavailable("weather"))
    }
}

pub struct ScriptedTrafficFeed {
    current: RwLock<Option<TrafficStatus>>,
}

impl ScriptedTrafficFeed {
    pub fn new(status: TrafficStatus) -> Self {
        Self {
            current: RwLock::new(Some(status)),
        }
    }

    pub fn set(&self, status: TrafficStatus) {
        *self.current.write().expect("traffic fixture poisoned") = Some(status);
    }

    pub fn set_unavailable(&self) {
        *self.current.write().expect("traffic fixture poisoned") = None;
    }
}

#[async_trait]
impl TrafficFeed for ScriptedTrafficFeed {
    async fn conditions(&self, _plan_id: &str) -> DomainResult<TrafficStatus> {
        self.current
            .read()
            .expect("traffic fixture poisoned")
            .clone()
            .ok_or_else(|| unavailable("traffic"))
    }
}

pub struct ScriptedFuelFeed {
    current: RwLock<Option<FuelReading>>,
}

impl ScriptedFuelFeed {
    pub fn new(reading: FuelReading) -> Self {
        Self {
            current: RwLock::new(Some(reading)),
        }
    }

    pub fn set(&self, reading: FuelReading) {
        *self.current.write().expect("fuel fixture poisoned") = Some(reading);
    }

    pub fn set_unavailable(&self) {
        *self.current.write().expect("fuel fixture poisoned") = None;
    }
}

#[async_trait]
impl FuelFeed for ScriptedFuelFeed {
    async fn reading(&self, _vehicle_id: &str) -> DomainResult<FuelReading> {
        self.current
            .read()
            .expect("fuel fixture poisoned")
            .clone()
            .ok_or_else(|| unavailable("fuel price"))
    }
}
