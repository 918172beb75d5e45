//! Standalone monitoring worker. Watches the active plans recorded in a
//! shared file event store and runs the 60-second trigger loop against the
//! live feeds. Runs until interrupted.

use linehaul_app::Config;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use linehaul_app::adapters::inbound::{FileEventStore, InMemorySnapshotStore};
use linehaul_app::adapters::outbound::{
    init_combined_logger, FilesystemDataSource, LoggingAlertSink, ScriptedDockFeed,
    ScriptedFuelFeed, ScriptedTelemetryFeed, ScriptedTrafficFeed, ScriptedWeatherFeed,
    StaticFuelPriceProvider, StaticRoutingProvider, StaticWeatherProvider,
};
use linehaul_app::domains::dispatch::ports::DispatchDataSource;
use linehaul_app::application::{DispatchPlanningService, MonitoringService};
use linehaul_app::domains::dispatch::{
    ActivePlanRegistry, DispatchCommandActor, DispatcherParams, Driver, FuelStation, GeoPoint,
    Load, OptimizationPriority, PlanRequest, Stop, StopAction, Vehicle,
};
use linehaul_app::domains::monitoring::{
    AlertDispatcher, DriverTelemetry, FuelReading, MonitorFeeds, MonitorScheduler, TrafficStatus,
    WeatherNotice,
};
use linehaul_app::hos::HosState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = match Config::from_file("config.toml").await {
        Ok(config) => config,
        Err(_) => Config::default(),
    };

    println!("🚚 Monitor daemon starting");
    println!("   Tick interval: {}s", config.monitoring.tick_seconds);

    let event_store = Arc::new(FileEventStore::new("data/event_store"));
    let snapshot_store = Arc::new(InMemorySnapshotStore::new());
    let registry = Arc::new(ActivePlanRegistry::new());

    // Station table comes from the data dir when present, else a built-in
    // fixture keeps the daemon self-contained.
    let data_source =
        FilesystemDataSource::new(config.data.base_dir.as_ref().map(std::path::PathBuf::from));
    let stations = data_source
        .load_fuel_stations("stations.json")
        .unwrap_or_else(|_| {
            vec![FuelStation {
                name: "Pilot #77, Texarkana TX".to_string(),
                route_mile: 120.0,
                detour_miles: 3.0,
                price_per_gallon: 3.45,
            }]
        });

    // Fresh aggregate stream per run so restarts never fight the version
    // check on the shared file store.
    let board_id = format!("{}-{}", config.dispatcher_id, chrono::Utc::now().timestamp());
    let planning = DispatchPlanningService::new(
        board_id.clone(),
        config.planning.clone(),
        event_store,
        snapshot_store,
        registry,
        Arc::new(StaticRoutingProvider::new()),
        Arc::new(StaticFuelPriceProvider::new(stations)),
        Arc::new(StaticWeatherProvider::new(vec![
            "winter storm watch, I-40 corridor".to_string(),
        ])),
        config.event_store.snapshot_frequency,
    );

    let plan = planning.generate_plan(demo_request()).await?;
    println!(
        "📋 Watching plan {} ({} segments, feasible={})",
        plan.id,
        plan.segments.len(),
        plan.is_feasible
    );
    planning.activate(&plan.id).await?;
    let active = planning
        .get_plan(&plan.id)
        .await
        .ok_or("activated plan not found")?;

    let logger = init_combined_logger("logs/monitor_daemon.log");

    // Scripted feeds standing in for the ELD/weather/traffic integrations.
    // The telemetry is a driver nearing the break window so the proactive
    // triggers have something to say.
    let feeds = MonitorFeeds {
        telemetry: Arc::new(ScriptedTelemetryFeed::new(DriverTelemetry {
            position: GeoPoint { lat: 32.9, lon: -96.5 },
            route_mile: 45.0,
            off_route_miles: 0.4,
            minutes_stationary: 0.0,
            currently_driving: true,
            hos: HosState {
                hours_driven: 6.8,
                on_duty_hours: 7.4,
                hours_since_break: 6.9,
                cycle_hours_used: 41.0,
                split_credit: None,
            },
            vehicle_fault: None,
            customer_requests: vec![],
        })),
        dock: Arc::new(ScriptedDockFeed::new(None)),
        weather: Arc::new(ScriptedWeatherFeed::new(vec![WeatherNotice {
            description: "winter storm watch, I-40 corridor".to_string(),
            severe: true,
        }])),
        traffic: Arc::new(ScriptedTrafficFeed::new(TrafficStatus {
            delay_minutes: 12.0,
            eta: None,
        })),
        fuel: Arc::new(ScriptedFuelFeed::new(FuelReading {
            gallons: 96.0,
            price_per_gallon: Some(3.41),
        })),
    };

    let alert_dispatcher = Arc::new(AlertDispatcher::new(
        Arc::new(LoggingAlertSink::new(logger.clone())),
        logger.clone(),
        config.monitoring.alert_retry_attempts,
        config.monitoring.alert_retry_base_ms,
    ));
    let (event_sender, mut event_receiver) = mpsc::channel(100);
    let command_actor = Arc::new(DispatchCommandActor::new(event_sender));

    // Surface replan recommendations on the console as they arrive
    tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            println!("🔁 orchestrator signal: {:?}", event);
        }
    });

    let scheduler = Arc::new(MonitorScheduler::new(
        feeds,
        alert_dispatcher,
        command_actor,
        board_id.clone(),
        config.monitoring.thresholds.clone(),
        Duration::from_secs(config.monitoring.tick_seconds),
        Duration::from_millis(config.monitoring.fetch_timeout_ms),
        logger,
    ));
    let monitoring = MonitoringService::new(scheduler);
    monitoring.watch_plan(active).await?;
    monitoring.start().await;

    println!("✅ Monitor daemon running; ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    monitoring.shutdown().await;
    println!("👋 Monitor daemon stopped");

    Ok(())
}

fn demo_request() -> PlanRequest {
    let dallas = GeoPoint { lat: 32.7767, lon: -96.7970 };
    let memphis = GeoPoint { lat: 35.1495, lon: -90.0490 };

    PlanRequest {
        loads: vec![Load {
            id: "load-9102".to_string(),
            commodity: "paper goods".to_string(),
            weight_lbs: 36_500.0,
            stops: vec![
                Stop {
                    id: "stop-1".to_string(),
                    sequence: 1,
                    action: StopAction::Pickup,
                    address: "Dallas, TX".to_string(),
                    location: dallas,
                    dock_estimate_hours: 1.0,
                    off_duty_qualifying: false,
                    window: None,
                },
                Stop {
                    id: "stop-2".to_string(),
                    sequence: 2,
                    action: StopAction::Delivery,
                    address: "Memphis, TN".to_string(),
                    location: memphis,
                    dock_estimate_hours: 1.5,
                    off_duty_qualifying: false,
                    window: None,
                },
            ],
        }],
        driver: Driver {
            id: "driver-41".to_string(),
            name: "D. Okafor".to_string(),
            cycle_hours_used: 41.0,
        },
        vehicle: Vehicle {
            id: "truck-117".to_string(),
            tank_capacity_gal: 180.0,
            mpg: 7.0,
            current_fuel_gal: 150.0,
            current_location: Some(dallas),
        },
        departure_time: chrono::Utc::now(),
        priority: OptimizationPriority::MinimizeTime,
        params: DispatcherParams::default(),
    }
}
