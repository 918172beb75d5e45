use crate::common::aggregate::AggregateRoot;
use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::plan::{PlanStatus, RoutePlan};
use crate::domains::dispatch::aggregate::planner::{builder, feasibility, fuel, rest_policy};
use crate::domains::dispatch::aggregate::segment::{RestType, RouteSegment, SegmentDetail};
use crate::domains::dispatch::aggregate::types::PlanRequest;
use crate::domains::dispatch::events::DispatchEvent;
use crate::domains::dispatch::ports::{FuelPriceProvider, RoutingProvider, WeatherProvider};
use crate::domains::hos::{HosState, CYCLE_LIMIT_HOURS};
use crate::domains::monitoring::triggers::{Alert, TriggerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Planner knobs that are policy rather than regulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Range cushion kept in the tank at all times, in miles
    pub fuel_safety_margin_miles: f64,
    /// On-duty time charged for a fuel stop
    pub fuel_stop_service_hours: f64,
    /// Split pattern taken when `Auto` rest finds both patterns qualify
    pub auto_split_preference: RestType,
    pub cost_per_mile: f64,
    pub driver_cost_per_hour: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            fuel_safety_margin_miles: 60.0,
            fuel_stop_service_hours: 0.25,
            auto_split_preference: RestType::Split8_2,
            cost_per_mile: 0.38,
            driver_cost_per_hour: 28.0,
        }
    }
}

/// The dispatch aggregate: owns every plan it has generated plus the
/// active-plan-per-driver invariant, and records all transitions as events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatcher {
    pub id: String,
    pub plans: Vec<RoutePlan>,
    pub active_plan_by_driver: HashMap<String, String>,
    pub alerts: Vec<Alert>,
    pub config: PlannerConfig,
    pub version: u64,
    #[serde(skip)]
    uncommitted_events: Vec<DispatchEvent>,
}

impl Dispatcher {
    // Public methods for AggregateRoot trait
    pub fn uncommitted_events(&self) -> &[DispatchEvent] {
        &self.uncommitted_events
    }
    pub fn mark_events_as_committed(&mut self) {
        self.uncommitted_events.clear();
    }
    pub fn add_event(&mut self, event: DispatchEvent) {
        self.uncommitted_events.push(event);
    }
}

impl Dispatcher {
    pub fn new(id: String, config: PlannerConfig) -> Self {
        let mut dispatcher = Self {
            id: id.clone(),
            plans: Vec::new(),
            active_plan_by_driver: HashMap::new(),
            alerts: Vec::new(),
            config,
            version: 0,
            uncommitted_events: Vec::new(),
        };

        let event = DispatchEvent::DispatcherCreated {
            dispatcher_id: id,
            timestamp: Utc::now(),
        };
        dispatcher.add_event(event);
        dispatcher
    }

    pub fn plan(&self, plan_id: &str) -> Option<&RoutePlan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn active_plan_for(&self, driver_id: &str) -> Option<&RoutePlan> {
        self.active_plan_by_driver
            .get(driver_id)
            .and_then(|id| self.plan(id))
    }

    /// Generate a plan from loads, driver, vehicle and departure time.
    /// An infeasible result is not an error: the plan is still recorded in
    /// Draft with its issues attached. Invalid input and provider failures
    /// are hard rejections and nothing is recorded.
    pub fn generate_plan(
        &mut self,
        request: PlanRequest,
        routing: &dyn RoutingProvider,
        fuel_prices: &dyn FuelPriceProvider,
        weather: &dyn WeatherProvider,
    ) -> DomainResult<String> {
        Self::validate_request(&request)?;

        let stops = builder::visit_order(&request.loads)?;
        let origin = request.vehicle.current_location;
        let initial = HosState::seeded(request.driver.cycle_hours_used);

        let weather_alerts = weather.route_alerts(
            &origin.unwrap_or(stops[0].location),
            &stops[stops.len() - 1].location,
        )?;

        let draft = builder::build_draft(&stops, origin, request.departure_time, routing)?;

        let mut issues: Vec<String> = Vec::new();
        let segments = self.schedule_segments(&request, &draft, initial, fuel_prices, &mut issues)?;

        let mut report = feasibility::check_plan(
            &segments,
            &request.loads,
            &request.vehicle,
            &request.params,
            initial,
        );
        report.merge(issues);

        let plan_id = Uuid::new_v4().to_string();
        let plan = self.assemble_plan(plan_id.clone(), &request, segments, report, weather_alerts);

        let event = DispatchEvent::PlanGenerated {
            dispatcher_id: self.id.clone(),
            plan: Box::new(plan),
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(plan_id)
    }

    /// Compliance scheduling pipeline: rest/break insertion, fuel stops,
    /// then a second rest pass so fuel service time is on the clocks too.
    /// The second pass is a no-op unless fuel stops changed the timeline.
    fn schedule_segments(
        &self,
        request: &PlanRequest,
        draft: &[RouteSegment],
        initial: HosState,
        fuel_prices: &dyn FuelPriceProvider,
        issues: &mut Vec<String>,
    ) -> DomainResult<Vec<RouteSegment>> {
        let first_pass = rest_policy::insert_rest_and_breaks(
            draft,
            initial,
            request.departure_time,
            &request.params,
            request.priority,
            &self.config,
        );

        let rested = match first_pass {
            Ok(segments) => segments,
            Err(DomainError::ClockViolation {
                clock,
                limit_hours,
                detail,
            }) => {
                issues.push(format!(
                    "{} ({:.0}h) cannot be satisfied: {}",
                    clock, limit_hours, detail
                ));
                return Ok(draft.to_vec());
            }
            Err(other) => return Err(other),
        };

        let fuel_outcome = fuel::insert_fuel_stops(
            &rested,
            &request.vehicle,
            &request.params,
            fuel_prices,
            &self.config,
        )?;
        issues.extend(fuel_outcome.issues);

        match rest_policy::insert_rest_and_breaks(
            &fuel_outcome.segments,
            initial,
            request.departure_time,
            &request.params,
            request.priority,
            &self.config,
        ) {
            Ok(segments) => Ok(segments),
            Err(DomainError::ClockViolation {
                clock,
                limit_hours,
                detail,
            }) => {
                issues.push(format!(
                    "{} ({:.0}h) cannot be satisfied: {}",
                    clock, limit_hours, detail
                ));
                Ok(fuel_outcome.segments)
            }
            Err(other) => Err(other),
        }
    }

    fn validate_request(request: &PlanRequest) -> DomainResult<()> {
        if request.loads.is_empty() {
            return Err(DomainError::InvalidCommand {
                reason: "plan request has no loads".to_string(),
            });
        }
        for load in &request.loads {
            if load.stops.is_empty() {
                return Err(DomainError::InvalidCommand {
                    reason: format!("load {} has no stops", load.id),
                });
            }
        }
        if request.driver.id.is_empty() {
            return Err(DomainError::InvalidCommand {
                reason: "plan request has no driver".to_string(),
            });
        }
        if request.vehicle.mpg <= 0.0 || request.vehicle.tank_capacity_gal <= 0.0 {
            return Err(DomainError::InvalidCommand {
                reason: format!("vehicle {} has no usable fuel profile", request.vehicle.id),
            });
        }
        if request.vehicle.current_fuel_gal < 0.0
            || request.vehicle.current_fuel_gal > request.vehicle.tank_capacity_gal
        {
            return Err(DomainError::InvalidCommand {
                reason: format!(
                    "vehicle {} reports {:.1} gal against a {:.1} gal tank",
                    request.vehicle.id,
                    request.vehicle.current_fuel_gal,
                    request.vehicle.tank_capacity_gal
                ),
            });
        }
        if request.params.max_fuel_detour_miles < 0.0 {
            return Err(DomainError::InvalidCommand {
                reason: "max fuel detour must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    fn assemble_plan(
        &self,
        plan_id: String,
        request: &PlanRequest,
        segments: Vec<RouteSegment>,
        report: feasibility::FeasibilityReport,
        weather_alerts: Vec<String>,
    ) -> RoutePlan {
        let mut report = report;
        if request.driver.cycle_hours_used > CYCLE_LIMIT_HOURS {
            report.merge(vec![format!(
                "driver {} starts with {:.1} cycle hours, over the {:.0}h window",
                request.driver.id, request.driver.cycle_hours_used, CYCLE_LIMIT_HOURS
            )]);
        }

        let total_distance_miles: f64 = segments.iter().map(|s| s.distance_miles()).sum();
        let estimated_arrival = segments
            .last()
            .map(|s| s.end)
            .unwrap_or(request.departure_time);
        let total_trip_hours =
            (estimated_arrival - request.departure_time).num_milliseconds() as f64 / 3_600_000.0;
        let fuel_cost = fuel::fuel_spend(&segments);
        let total_cost_estimate = fuel_cost
            + self.config.cost_per_mile * total_distance_miles
            + self.config.driver_cost_per_hour * total_trip_hours;

        RoutePlan {
            id: plan_id,
            driver_id: request.driver.id.clone(),
            vehicle_id: request.vehicle.id.clone(),
            load_ids: request.loads.iter().map(|l| l.id.clone()).collect(),
            departure_time: request.departure_time,
            estimated_arrival,
            total_distance_miles,
            total_trip_hours,
            total_driving_days: driving_days(&segments),
            total_cost_estimate,
            priority: request.priority,
            params: request.params.clone(),
            is_feasible: report.is_feasible,
            feasibility_issues: report.issues,
            status: PlanStatus::Draft,
            weather_alerts,
            segments,
            created_at: Utc::now(),
        }
    }

    /// Activate a draft plan. The driver's previously active plan, if any,
    /// is deactivated in the same command so exactly one plan per driver is
    /// ever active. Fails atomically: on any rejection nothing changes.
    pub fn activate_plan(&mut self, plan_id: &str) -> DomainResult<()> {
        let plan = self
            .plan(plan_id)
            .ok_or_else(|| DomainError::AggregateNotFound {
                id: plan_id.to_string(),
            })?;
        if plan.status != PlanStatus::Draft {
            return Err(DomainError::InvalidCommand {
                reason: format!("plan {} is {:?}, only draft plans activate", plan_id, plan.status),
            });
        }
        if !plan.is_feasible {
            let first_issue = plan
                .feasibility_issues
                .first()
                .cloned()
                .unwrap_or_else(|| "unspecified issue".to_string());
            return Err(DomainError::InvalidCommand {
                reason: format!("plan {} is infeasible: {}", plan_id, first_issue),
            });
        }

        let driver_id = plan.driver_id.clone();
        let now = Utc::now();

        if let Some(prior) = self.active_plan_by_driver.get(&driver_id).cloned() {
            let event = DispatchEvent::PlanDeactivated {
                dispatcher_id: self.id.clone(),
                plan_id: prior,
                driver_id: driver_id.clone(),
                reason: format!("superseded by plan {}", plan_id),
                timestamp: now,
            };
            self.add_event(event.clone());
            self.apply(&event)?;
        }

        let event = DispatchEvent::PlanActivated {
            dispatcher_id: self.id.clone(),
            plan_id: plan_id.to_string(),
            driver_id,
            timestamp: now,
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    /// Cancel a draft or active plan. Loads on the plan become assignable
    /// to a new plan; they are not locked to the cancelled one.
    pub fn cancel_plan(&mut self, plan_id: &str) -> DomainResult<()> {
        let plan = self
            .plan(plan_id)
            .ok_or_else(|| DomainError::AggregateNotFound {
                id: plan_id.to_string(),
            })?;
        if plan.status.is_terminal() {
            return Err(DomainError::InvalidCommand {
                reason: format!("plan {} is already {:?}", plan_id, plan.status),
            });
        }

        let event = DispatchEvent::PlanCancelled {
            dispatcher_id: self.id.clone(),
            plan_id: plan_id.to_string(),
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    /// Mark an active plan completed once its final dock arrival has passed.
    pub fn complete_plan(&mut self, plan_id: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let plan = self
            .plan(plan_id)
            .ok_or_else(|| DomainError::AggregateNotFound {
                id: plan_id.to_string(),
            })?;
        if plan.status != PlanStatus::Active {
            return Err(DomainError::InvalidCommand {
                reason: format!("plan {} is {:?}, only active plans complete", plan_id, plan.status),
            });
        }
        if let Some(arrival) = plan.final_dock_arrival() {
            if now < arrival {
                return Err(DomainError::InvalidCommand {
                    reason: format!(
                        "plan {} final arrival {} has not passed",
                        plan_id,
                        arrival.to_rfc3339()
                    ),
                });
            }
        }

        let event = DispatchEvent::PlanCompleted {
            dispatcher_id: self.id.clone(),
            plan_id: plan_id.to_string(),
            timestamp: now,
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    pub fn raise_alert(&mut self, alert: Alert) -> DomainResult<()> {
        if self.plan(&alert.plan_id).is_none() {
            return Err(DomainError::AggregateNotFound {
                id: alert.plan_id.clone(),
            });
        }
        let event = DispatchEvent::AlertRaised {
            dispatcher_id: self.id.clone(),
            alert: Box::new(alert),
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    pub fn acknowledge_alert(&mut self, alert_id: Uuid) -> DomainResult<()> {
        if !self.alerts.iter().any(|a| a.id == alert_id) {
            return Err(DomainError::AggregateNotFound {
                id: alert_id.to_string(),
            });
        }
        let event = DispatchEvent::AlertAcknowledged {
            dispatcher_id: self.id.clone(),
            alert_id,
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    pub fn resolve_alert(&mut self, alert_id: Uuid) -> DomainResult<()> {
        if !self.alerts.iter().any(|a| a.id == alert_id) {
            return Err(DomainError::AggregateNotFound {
                id: alert_id.to_string(),
            });
        }
        let event = DispatchEvent::AlertResolved {
            dispatcher_id: self.id.clone(),
            alert_id,
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }

    pub fn recommend_replan(&mut self, plan_id: &str, trigger_type: TriggerType) -> DomainResult<()> {
        let plan = self
            .plan(plan_id)
            .ok_or_else(|| DomainError::AggregateNotFound {
                id: plan_id.to_string(),
            })?;
        if plan.status != PlanStatus::Active {
            return Err(DomainError::InvalidCommand {
                reason: format!("plan {} is not active", plan_id),
            });
        }
        let event = DispatchEvent::ReplanRecommended {
            dispatcher_id: self.id.clone(),
            plan_id: plan_id.to_string(),
            trigger_type,
            timestamp: Utc::now(),
        };
        self.add_event(event.clone());
        self.apply(&event)?;
        Ok(())
    }
}

/// Duty tours, not calendar days: a new driving day starts after every rest
/// that resets the drive clock ahead of further driving.
fn driving_days(segments: &[RouteSegment]) -> u32 {
    let has_driving = segments.iter().any(|s| s.is_drive());
    if !has_driving {
        return 0;
    }
    let last_drive = segments
        .iter()
        .rposition(|s| s.is_drive())
        .unwrap_or(0);

    let mut days = 1;
    let mut prev_driven = 0.0;
    for seg in &segments[..last_drive] {
        if !matches!(
            seg.detail,
            SegmentDetail::Rest { .. } | SegmentDetail::Dock { .. }
        ) {
            prev_driven = seg.hos_after.hours_driven;
            continue;
        }
        if seg.hos_after.hours_driven == 0.0 && prev_driven > 0.0 {
            days += 1;
        }
        prev_driven = seg.hos_after.hours_driven;
    }
    days
}
