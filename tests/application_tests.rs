use chrono::{Duration, Utc};
use linehaul_app::adapters::inbound::{InMemoryEventStore, InMemorySnapshotStore};
use linehaul_app::adapters::outbound::{
    StaticFuelPriceProvider, StaticRoutingProvider, StaticWeatherProvider,
};
use linehaul_app::application::DispatchPlanningService;
use linehaul_app::common::{ApplicationError, DomainError};
use linehaul_app::domains::dispatch::*;
use std::sync::Arc;

struct TestApp {
    service: DispatchPlanningService,
    event_store: Arc<InMemoryEventStore>,
    registry: Arc<ActivePlanRegistry>,
    fuel_prices: Arc<StaticFuelPriceProvider>,
}

fn app() -> TestApp {
    let event_store = Arc::new(InMemoryEventStore::new());
    let snapshot_store = Arc::new(InMemorySnapshotStore::new());
    let registry = Arc::new(ActivePlanRegistry::new());
    let fuel_prices = Arc::new(StaticFuelPriceProvider::new(vec![
        FuelStation {
            name: "Flying J #221".to_string(),
            route_mile: 160.0,
            detour_miles: 2.5,
            price_per_gallon: 3.49,
        },
        FuelStation {
            name: "Loves #318".to_string(),
            route_mile: 420.0,
            detour_miles: 7.0,
            price_per_gallon: 3.29,
        },
    ]));

    let service = DispatchPlanningService::new(
        "board-app".to_string(),
        PlannerConfig::default(),
        event_store.clone(),
        snapshot_store,
        registry.clone(),
        Arc::new(StaticRoutingProvider::new()),
        fuel_prices.clone(),
        Arc::new(StaticWeatherProvider::new(vec![
            "high wind advisory".to_string(),
        ])),
        100,
    );

    TestApp {
        service,
        event_store,
        registry,
        fuel_prices,
    }
}

fn request(driver_id: &str) -> PlanRequest {
    let dallas = GeoPoint { lat: 32.7767, lon: -96.7970 };
    let chicago = GeoPoint { lat: 41.8781, lon: -87.6298 };

    PlanRequest {
        loads: vec![Load {
            id: "load-1".to_string(),
            commodity: "palletized freight".to_string(),
            weight_lbs: 38_000.0,
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
                    address: "Chicago, IL".to_string(),
                    location: chicago,
                    dock_estimate_hours: 1.5,
                    off_duty_qualifying: true,
                    window: None,
                },
            ],
        }],
        driver: Driver {
            id: driver_id.to_string(),
            name: "Test Driver".to_string(),
            cycle_hours_used: 10.0,
        },
        vehicle: Vehicle {
            id: "truck-1".to_string(),
            tank_capacity_gal: 200.0,
            mpg: 6.5,
            current_fuel_gal: 120.0,
            current_location: Some(dallas),
        },
        departure_time: Utc::now(),
        priority: OptimizationPriority::Balance,
        params: DispatcherParams::default(),
    }
}

#[tokio::test]
async fn test_generate_plan_persists_events_and_totals() {
    let app = app();
    let plan = app.service.generate_plan(request("driver-1")).await.unwrap();

    assert!(plan.is_feasible, "issues: {:?}", plan.feasibility_issues);
    assert_eq!(plan.status, PlanStatus::Draft);
    assert!(plan.total_distance_miles > 800.0);
    assert!(plan.total_trip_hours > 15.0);
    assert!(plan.total_cost_estimate > 0.0);
    assert_eq!(plan.weather_alerts, vec!["high wind advisory".to_string()]);

    // Dallas to Chicago is out of tank range; a fuel stop must be planned
    // and stay within the detour allowance.
    let fuel_segments: Vec<_> = plan
        .segments
        .iter()
        .filter_map(|s| match &s.detail {
            SegmentDetail::Fuel { detour_miles, .. } => Some(*detour_miles),
            _ => None,
        })
        .collect();
    assert!(!fuel_segments.is_empty());
    assert!(fuel_segments
        .iter()
        .all(|d| *d <= plan.params.max_fuel_detour_miles));

    // DispatcherCreated + PlanGenerated are on the store.
    assert_eq!(app.event_store.event_count("board-app").await, 2);
}

#[tokio::test]
async fn test_activation_swaps_driver_active_plan_atomically() {
    let app = app();
    let plan_a = app.service.generate_plan(request("driver-1")).await.unwrap();
    let plan_b = app.service.generate_plan(request("driver-1")).await.unwrap();

    app.service.activate(&plan_a.id).await.unwrap();
    assert_eq!(app.registry.active_plan("driver-1"), Some(plan_a.id.clone()));

    app.service.activate(&plan_b.id).await.unwrap();
    assert_eq!(app.registry.active_plan("driver-1"), Some(plan_b.id.clone()));

    let a = app.service.get_plan(&plan_a.id).await.unwrap();
    let b = app.service.get_plan(&plan_b.id).await.unwrap();
    assert_ne!(a.status, PlanStatus::Active);
    assert_eq!(b.status, PlanStatus::Active);

    let active = app.service.active_plan_for("driver-1").await.unwrap();
    assert_eq!(active.id, plan_b.id);
}

#[tokio::test]
async fn test_registry_conflict_fails_activation_cleanly() {
    let app = app();
    let plan = app.service.generate_plan(request("driver-1")).await.unwrap();

    // Another writer grabbed the driver first; the service's view is stale.
    app.registry
        .compare_and_activate("driver-1", None, "someone-elses-plan")
        .unwrap();

    let result = app.service.activate(&plan.id).await;
    assert!(result.is_err());

    // Nothing moved: the foreign activation stands, our plan stays draft.
    assert_eq!(
        app.registry.active_plan("driver-1"),
        Some("someone-elses-plan".to_string())
    );
    assert_eq!(
        app.service.get_plan(&plan.id).await.unwrap().status,
        PlanStatus::Draft
    );
}

#[tokio::test]
async fn test_cancel_releases_active_slot() {
    let app = app();
    let plan = app.service.generate_plan(request("driver-1")).await.unwrap();
    app.service.activate(&plan.id).await.unwrap();

    app.service.cancel(&plan.id).await.unwrap();
    assert_eq!(app.registry.active_plan("driver-1"), None);
    assert_eq!(
        app.service.get_plan(&plan.id).await.unwrap().status,
        PlanStatus::Cancelled
    );

    // Loads are reassignable: a new plan for the same driver activates.
    let next = app.service.generate_plan(request("driver-1")).await.unwrap();
    app.service.activate(&next.id).await.unwrap();
    assert_eq!(app.registry.active_plan("driver-1"), Some(next.id));
}

#[tokio::test]
async fn test_complete_after_final_arrival() {
    let app = app();
    let plan = app.service.generate_plan(request("driver-1")).await.unwrap();
    app.service.activate(&plan.id).await.unwrap();

    let arrival = plan.final_dock_arrival().unwrap();
    assert!(app.service.complete(&plan.id, arrival - Duration::hours(2)).await.is_err());

    app.service
        .complete(&plan.id, arrival + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(
        app.service.get_plan(&plan.id).await.unwrap().status,
        PlanStatus::Completed
    );
    assert_eq!(app.registry.active_plan("driver-1"), None);
}

#[tokio::test]
async fn test_fuel_feed_outage_fails_fast_with_nothing_persisted() {
    let app = app();
    app.fuel_prices.set_available(false);

    let result = app.service.generate_plan(request("driver-1")).await;
    match result {
        Err(ApplicationError::Domain(DomainError::InfrastructureError(msg))) => {
            assert!(msg.contains("fuel price feed"));
        }
        other => panic!("Expected infrastructure failure, got {:?}", other.map(|p| p.id)),
    }

    // No partial plan, no events committed.
    assert_eq!(app.event_store.event_count("board-app").await, 0);
    assert!(app.service.active_plan_for("driver-1").await.is_none());
}

#[tokio::test]
async fn test_two_drivers_activate_independently() {
    let app = app();
    let plan_1 = app.service.generate_plan(request("driver-1")).await.unwrap();
    let plan_2 = app.service.generate_plan(request("driver-2")).await.unwrap();

    app.service.activate(&plan_1.id).await.unwrap();
    app.service.activate(&plan_2.id).await.unwrap();

    assert_eq!(app.registry.active_plan("driver-1"), Some(plan_1.id));
    assert_eq!(app.registry.active_plan("driver-2"), Some(plan_2.id));
}

#[tokio::test]
async fn test_alert_lifecycle_through_service() {
    use linehaul_app::domains::monitoring::triggers::{Alert, Trigger, TriggerType};

    let app = app();
    let plan = app.service.generate_plan(request("driver-1")).await.unwrap();

    let trigger = Trigger::new(
        TriggerType::TrafficDelay,
        &plan.id,
        Utc::now(),
        "45 min delay on I-44".to_string(),
    );
    let alert = Alert::from_trigger(&trigger, trigger.observed_at);
    let alert_id = alert.id;

    app.service.raise_alert(alert).await.unwrap();
    assert_eq!(app.service.open_alerts().await.len(), 1);

    app.service.acknowledge_alert(alert_id).await.unwrap();
    app.service.resolve_alert(alert_id).await.unwrap();
    assert!(app.service.open_alerts().await.is_empty());
}

#[tokio::test]
async fn test_snapshot_written_at_configured_frequency() {
    let event_store = Arc::new(InMemoryEventStore::new());
    let snapshot_store = Arc::new(InMemorySnapshotStore::new());
    let service = DispatchPlanningService::new(
        "board-snap".to_string(),
        PlannerConfig::default(),
        event_store,
        snapshot_store.clone(),
        Arc::new(ActivePlanRegistry::new()),
        Arc::new(StaticRoutingProvider::new()),
        Arc::new(StaticFuelPriceProvider::new(vec![])),
        Arc::new(StaticWeatherProvider::new(vec![])),
        1,
    );

    let mut short_haul = request("driver-1");
    short_haul.vehicle.current_fuel_gal = 200.0;
    service.generate_plan(short_haul).await.unwrap();

    use linehaul_app::common::SnapshotStore;
    let snapshot = snapshot_store
        .load_snapshot("board-snap", None)
        .await
        .unwrap();
    assert!(snapshot.is_some());
    assert_eq!(snapshot.unwrap().aggregate_type, "Dispatcher");
}

#[tokio::test]
async fn test_board_projection_counts_transitions() {
    let app = app();
    let plan_a = app.service.generate_plan(request("driver-1")).await.unwrap();
    let plan_b = app.service.generate_plan(request("driver-1")).await.unwrap();
    app.service.activate(&plan_a.id).await.unwrap();
    app.service.activate(&plan_b.id).await.unwrap(); // deactivates A
    app.service.cancel(&plan_b.id).await.unwrap();

    let projection = app.service.board_projection().await.unwrap();
    assert_eq!(projection.plans_generated, 2);
    assert_eq!(projection.plans_activated, 2);
    assert_eq!(projection.plans_cancelled, 2); // superseded A + cancelled B
}
