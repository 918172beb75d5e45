//! Trigger evaluation for one plan against one telemetry snapshot. Pure:
//! the only side effect in the monitoring pipeline is alert emission, and
//! that happens downstream of this module. An unavailable facet silently
//! skips its trigger category; the rest still evaluate.

use crate::domains::dispatch::aggregate::plan::RoutePlan;
use crate::domains::dispatch::aggregate::planner::detention::billable_detention_hours;
use crate::domains::dispatch::aggregate::segment::SegmentDetail;
use crate::domains::hos::{
    BREAK_WINDOW_HOURS, CYCLE_LIMIT_HOURS, DRIVE_LIMIT_HOURS, DUTY_LIMIT_HOURS,
};
use crate::domains::monitoring::telemetry::{DriverTelemetry, TelemetrySnapshot};
use crate::domains::monitoring::triggers::{Trigger, TriggerType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerThresholds {
    pub hos_warning_hours: f64,
    pub not_moving_minutes: f64,
    pub eta_change_hours: f64,
    pub traffic_delay_minutes: f64,
    pub route_deviation_miles: f64,
    pub fuel_low_gallons: f64,
    pub rest_skip_grace_minutes: f64,
    pub appointment_delay_minutes: f64,
    pub appointment_horizon_hours: f64,
}

impl Default for TriggerThresholds {
    fn default() -> Self {
        Self {
            hos_warning_hours: 2.0,
            not_moving_minutes: 15.0,
            eta_change_hours: 1.0,
            traffic_delay_minutes: 30.0,
            route_deviation_miles: 5.0,
            fuel_low_gallons: 30.0,
            rest_skip_grace_minutes: 30.0,
            appointment_delay_minutes: 15.0,
            appointment_horizon_hours: 4.0,
        }
    }
}

pub fn evaluate(
    plan: &RoutePlan,
    snapshot: &TelemetrySnapshot,
    now: DateTime<Utc>,
    thresholds: &TriggerThresholds,
) -> Vec<Trigger> {
    let mut fired = Vec::new();

    if let Some(telemetry) = snapshot.telemetry.value() {
        evaluate_hos(plan, telemetry, now, thresholds, &mut fired);
        evaluate_movement(plan, telemetry, now, thresholds, &mut fired);

        if let Some(fault) = &telemetry.vehicle_fault {
            fired.push(Trigger::new(
                TriggerType::VehicleIssue,
                &plan.id,
                now,
                format!("telematics fault: {}", fault),
            ));
        }
        if telemetry.off_route_miles > thresholds.route_deviation_miles {
            fired.push(Trigger::new(
                TriggerType::RouteDeviation,
                &plan.id,
                now,
                format!("{:.1} mi off planned route", telemetry.off_route_miles),
            ));
        }
        if !telemetry.customer_requests.is_empty() {
            fired.push(Trigger::new(
                TriggerType::CustomerRequest,
                &plan.id,
                now,
                telemetry.customer_requests.join("; "),
            ));
        }
    }

    if let Some(Some(dock)) = snapshot.dock.value() {
        if dock.hours_on_dock > dock.estimated_hours {
            let overage = dock.hours_on_dock - dock.estimated_hours;
            let billable = billable_detention_hours(dock.estimated_hours, dock.hours_on_dock);
            fired.push(Trigger::new(
                TriggerType::DockDelay,
                &plan.id,
                now,
                format!(
                    "stop {}: {:.1}h on dock against {:.1}h estimate ({:.1}h over, {:.1}h billable)",
                    dock.stop_id, dock.hours_on_dock, dock.estimated_hours, overage, billable
                ),
            ));
        }
    }

    if let Some(notices) = snapshot.weather.value() {
        if let Some(severe) = notices.iter().find(|n| n.severe) {
            fired.push(Trigger::new(
                TriggerType::WeatherAlert,
                &plan.id,
                now,
                severe.description.clone(),
            ));
        }
    }

    if let Some(traffic) = snapshot.traffic.value() {
        if traffic.delay_minutes > thresholds.traffic_delay_minutes {
            fired.push(Trigger::new(
                TriggerType::TrafficDelay,
                &plan.id,
                now,
                format!("{:.0} min traffic delay on route", traffic.delay_minutes),
            ));
        }
        if let Some(eta) = traffic.eta {
            let shift_hours = (eta - plan.estimated_arrival).num_minutes() as f64 / 60.0;
            if shift_hours.abs() > thresholds.eta_change_hours {
                fired.push(Trigger::new(
                    TriggerType::EtaChange,
                    &plan.id,
                    now,
                    format!(
                        "ETA moved {:+.1}h against plan ({})",
                        shift_hours,
                        eta.to_rfc3339()
                    ),
                ));
            }
        }
        evaluate_appointment_risk(plan, traffic.delay_minutes, now, thresholds, &mut fired);
    }

    if let Some(fuel) = snapshot.fuel.value() {
        if fuel.gallons < thresholds.fuel_low_gallons {
            let price = fuel
                .price_per_gallon
                .map(|p| format!(", ${:.2}/gal nearby", p))
                .unwrap_or_default();
            fired.push(Trigger::new(
                TriggerType::FuelLow,
                &plan.id,
                now,
                format!("{:.1} gal remaining{}", fuel.gallons, price),
            ));
        }
    }

    fired
}

fn evaluate_hos(
    plan: &RoutePlan,
    telemetry: &DriverTelemetry,
    now: DateTime<Utc>,
    thresholds: &TriggerThresholds,
    fired: &mut Vec<Trigger>,
) {
    let hos = &telemetry.hos;

    // Reactive: already over a driving limit.
    let over = [
        ("drive clock", hos.hours_driven, DRIVE_LIMIT_HOURS),
        ("duty clock", hos.on_duty_hours, DUTY_LIMIT_HOURS),
        ("cycle clock", hos.cycle_hours_used, CYCLE_LIMIT_HOURS),
    ]
    .into_iter()
    .find(|(_, value, limit)| value > limit);

    if let Some((clock, value, limit)) = over {
        fired.push(Trigger::new(
            TriggerType::HosViolation,
            &plan.id,
            now,
            format!("{} at {:.2}h, limit {:.0}h", clock, value, limit),
        ));
    } else {
        // Proactive: a clock inside the warning window.
        let tightest = [
            ("drive clock", DRIVE_LIMIT_HOURS - hos.hours_driven),
            ("duty clock", DUTY_LIMIT_HOURS - hos.on_duty_hours),
            ("break window", BREAK_WINDOW_HOURS - hos.hours_since_break),
            ("cycle clock", CYCLE_LIMIT_HOURS - hos.cycle_hours_used),
        ]
        .into_iter()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((clock, remaining)) = tightest {
            if remaining < thresholds.hos_warning_hours {
                fired.push(Trigger::new(
                    TriggerType::HosApproachingLimit,
                    &plan.id,
                    now,
                    format!("{} has {:.1}h remaining", clock, remaining.max(0.0)),
                ));
            }
        }
    }

    // Compliance: the 30-minute break is overdue.
    if hos.hours_since_break > BREAK_WINDOW_HOURS {
        fired.push(Trigger::new(
            TriggerType::BreakComplianceShortfall,
            &plan.id,
            now,
            format!(
                "{:.1}h since last break, window is {:.0}h",
                hos.hours_since_break, BREAK_WINDOW_HOURS
            ),
        ));
    }
}

fn evaluate_movement(
    plan: &RoutePlan,
    telemetry: &DriverTelemetry,
    now: DateTime<Utc>,
    thresholds: &TriggerThresholds,
    fired: &mut Vec<Trigger>,
) {
    let scheduled = plan
        .segments
        .iter()
        .find(|s| s.start <= now && now < s.end)
        .map(|s| &s.detail);

    if matches!(scheduled, Some(SegmentDetail::Drive { .. }))
        && telemetry.minutes_stationary >= thresholds.not_moving_minutes
    {
        fired.push(Trigger::new(
            TriggerType::DriverNotMoving,
            &plan.id,
            now,
            format!(
                "stationary {:.0} min during a scheduled drive segment",
                telemetry.minutes_stationary
            ),
        ));
    }

    // Compliance: driving through a scheduled rest or break.
    let grace = chrono::Duration::minutes(thresholds.rest_skip_grace_minutes as i64);
    let skipped_rest = plan.segments.iter().any(|s| {
        matches!(
            s.detail,
            SegmentDetail::Rest { .. } | SegmentDetail::Break { .. }
        ) && s.start + grace <= now
            && now < s.end
    });
    if skipped_rest && telemetry.currently_driving {
        fired.push(Trigger::new(
            TriggerType::RestStopSkipped,
            &plan.id,
            now,
            "driver is moving through a scheduled rest period".to_string(),
        ));
    }
}

fn evaluate_appointment_risk(
    plan: &RoutePlan,
    delay_minutes: f64,
    now: DateTime<Utc>,
    thresholds: &TriggerThresholds,
    fired: &mut Vec<Trigger>,
) {
    if delay_minutes <= thresholds.appointment_delay_minutes {
        return;
    }
    let horizon = now + chrono::Duration::minutes((thresholds.appointment_horizon_hours * 60.0) as i64);
    let upcoming = plan.segments.iter().find(|s| {
        matches!(s.detail, SegmentDetail::Dock { .. }) && s.start > now && s.start <= horizon
    });
    if let Some(dock) = upcoming {
        if let SegmentDetail::Dock { stop_id, .. } = &dock.detail {
            fired.push(Trigger::new(
                TriggerType::AppointmentRisk,
                &plan.id,
                now,
                format!(
                    "{:.0} min delay against appointment at stop {} ({})",
                    delay_minutes,
                    stop_id,
                    dock.start.to_rfc3339()
                ),
            ));
        }
    }
}
