use linehaul_app::Config;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use linehaul_app::adapters::inbound::{InMemoryEventStore, InMemorySnapshotStore};
use linehaul_app::adapters::outbound::{
    init_console_logger, LoggingAlertSink, ScriptedDockFeed, ScriptedFuelFeed,
    ScriptedTelemetryFeed, ScriptedTrafficFeed, ScriptedWeatherFeed, StaticFuelPriceProvider,
    StaticRoutingProvider, StaticWeatherProvider,
};
use linehaul_app::application::{DispatchPlanningService, MonitoringService};
use linehaul_app::domains::dispatch::{
    ActivePlanRegistry, DispatchCommandActor, DispatcherParams, Driver, FuelStation, GeoPoint,
    Load, OptimizationPriority, PlanRequest, Stop, StopAction, Vehicle,
};
use linehaul_app::domains::monitoring::{
    AlertDispatcher, DriverTelemetry, FuelReading, MonitorFeeds, MonitorScheduler, TrafficStatus,
};
use linehaul_app::hos::HosState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Linehaul App");

    let config = match Config::from_file("config.toml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("config.toml not loaded ({}), using defaults", e);
            Config::default()
        }
    };
    info!("Monitoring tick: {}s", config.monitoring.tick_seconds);

    // Stores and the active-plan authority
    let event_store = Arc::new(InMemoryEventStore::new());
    let snapshot_store = Arc::new(InMemorySnapshotStore::new());
    let registry = Arc::new(ActivePlanRegistry::new());

    // Fixture-backed planning collaborators
    let routing = Arc::new(StaticRoutingProvider::new());
    let fuel_prices = Arc::new(StaticFuelPriceProvider::new(demo_stations()));
    let weather = Arc::new(StaticWeatherProvider::new(vec![]));

    let planning = DispatchPlanningService::new(
        config.dispatcher_id.clone(),
        config.planning.clone(),
        event_store.clone(),
        snapshot_store.clone(),
        registry.clone(),
        routing,
        fuel_prices,
        weather,
        config.event_store.snapshot_frequency,
    );

    // Generate and activate a demo plan
    let plan = planning.generate_plan(demo_request()).await?;
    info!(
        "Plan {}: {:.0} mi, {:.1} h, {} driving days, {} segments, feasible={}",
        plan.id,
        plan.total_distance_miles,
        plan.total_trip_hours,
        plan.total_driving_days,
        plan.segments.len(),
        plan.is_feasible
    );
    for issue in &plan.feasibility_issues {
        warn!("feasibility issue: {}", issue);
    }

    if !plan.is_feasible {
        info!("Plan left in draft; adjust inputs and regenerate");
        return Ok(());
    }
    planning.activate(&plan.id).await?;
    let active = planning
        .get_plan(&plan.id)
        .await
        .ok_or("activated plan not found")?;

    // Wire the monitoring loop against scripted feeds
    let logger = init_console_logger();
    let feeds = MonitorFeeds {
        telemetry: Arc::new(ScriptedTelemetryFeed::new(demo_telemetry(&active.departure_time))),
        dock: Arc::new(ScriptedDockFeed::new(None)),
        weather: Arc::new(ScriptedWeatherFeed::new(vec![])),
        traffic: Arc::new(ScriptedTrafficFeed::new(TrafficStatus {
            delay_minutes: 0.0,
            eta: None,
        })),
        fuel: Arc::new(ScriptedFuelFeed::new(FuelReading {
            gallons: 120.0,
            price_per_gallon: Some(3.39),
        })),
    };
    let alert_dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(LoggingAlertSink::new(logger.clone())),
        logger.clone(),
        config.monitoring.alert_retry_attempts,
        config.monitoring.alert_retry_base_ms,
    ));
    let (event_sender, _event_receiver) = mpsc::channel(100);
    let command_actor = Arc::new(DispatchCommandActor::new(event_sender));

    let scheduler = Arc::new(MonitorScheduler::new(
        feeds,
        alert_dispatcher,
        command_actor,
        config.dispatcher_id.clone(),
        config.monitoring.thresholds.clone(),
        Duration::from_secs(config.monitoring.tick_seconds),
        Duration::from_millis(config.monitoring.fetch_timeout_ms),
        logger,
    ));
    let monitoring = MonitoringService::new(scheduler);
    monitoring.watch_plan(active).await?;
    monitoring.start().await;

    info!("Linehaul App started successfully");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down Linehaul App");
    monitoring.shutdown().await;

    Ok(())
}

fn demo_request() -> PlanRequest {
    let dallas = GeoPoint { lat: 32.7767, lon: -96.7970 };
    let okc = GeoPoint { lat: 35.4676, lon: -97.5164 };
    let chicago = GeoPoint { lat: 41.8781, lon: -87.6298 };

    PlanRequest {
        loads: vec![Load {
            id: "load-4417".to_string(),
            commodity: "palletized beverages".to_string(),
            weight_lbs: 42_000.0,
            stops: vec![
                Stop {
                    id: "stop-1".to_string(),
                    sequence: 1,
                    action: StopAction::Pickup,
                    address: "Dallas, TX".to_string(),
                    location: dallas,
                    dock_estimate_hours: 1.5,
                    off_duty_qualifying: false,
                    window: None,
                },
                Stop {
                    id: "stop-2".to_string(),
                    sequence: 2,
                    action: StopAction::Pickup,
                    address: "Oklahoma City, OK".to_string(),
                    location: okc,
                    dock_estimate_hours: 1.0,
                    off_duty_qualifying: false,
                    window: None,
                },
                Stop {
                    id: "stop-3".to_string(),
                    sequence: 3,
                    action: StopAction::Delivery,
                    address: "Chicago, IL".to_string(),
                    location: chicago,
                    dock_estimate_hours: 2.0,
                    off_duty_qualifying: true,
                    window: None,
                },
            ],
        }],
        driver: Driver {
            id: "driver-88".to_string(),
            name: "R. Alvarez".to_string(),
            cycle_hours_used: 12.5,
        },
        vehicle: Vehicle {
            id: "truck-204".to_string(),
            tank_capacity_gal: 200.0,
            mpg: 6.5,
            current_fuel_gal: 120.0,
            current_location: Some(dallas),
        },
        departure_time: chrono::Utc::now(),
        priority: OptimizationPriority::Balance,
        params: DispatcherParams::default(),
    }
}

fn demo_stations() -> Vec<FuelStation> {
    vec![
        FuelStation {
            name: "Flying J #221, Ardmore OK".to_string(),
            route_mile: 160.0,
            detour_miles: 2.5,
            price_per_gallon: 3.49,
        },
        FuelStation {
            name: "Loves #318, Wichita KS".to_string(),
            route_mile: 420.0,
            detour_miles: 7.0,
            price_per_gallon: 3.29,
        },
        FuelStation {
            name: "TA Travel Center, Springfield IL".to_string(),
            route_mile: 760.0,
            detour_miles: 1.5,
            price_per_gallon: 3.69,
        },
    ]
}

fn demo_telemetry(departure: &chrono::DateTime<chrono::Utc>) -> DriverTelemetry {
    DriverTelemetry {
        position: GeoPoint { lat: 32.7767, lon: -96.7970 },
        route_mile: 0.0,
        off_route_miles: 0.0,
        minutes_stationary: 0.0,
        currently_driving: chrono::Utc::now() > *departure,
        hos: HosState::seeded(12.5),
        vehicle_fault: None,
        customer_requests: vec![],
    }
}
