//! Final validation pass. Re-walks the assembled segment list, recomputing
//! clock state at every boundary, and reports violations as human-readable
//! issues. An infeasible plan is a first-class result; the dispatcher sees
//! the issues and adjusts inputs.

use crate::domains::dispatch::aggregate::segment::{RouteSegment, SegmentDetail};
use crate::domains::dispatch::aggregate::types::{DispatcherParams, Load, StopAction, Vehicle};
use crate::domains::hos::{
    Activity, HosClock, HosState, BREAK_WINDOW_HOURS, CYCLE_LIMIT_HOURS, DRIVE_LIMIT_HOURS,
    DUTY_LIMIT_HOURS,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub is_feasible: bool,
    pub issues: Vec<String>,
}

impl FeasibilityReport {
    pub fn feasible() -> Self {
        Self {
            is_feasible: true,
            issues: Vec::new(),
        }
    }

    pub fn merge(&mut self, issues: Vec<String>) {
        if !issues.is_empty() {
            self.is_feasible = false;
            self.issues.extend(issues);
        }
    }
}

pub fn check_plan(
    segments: &[RouteSegment],
    loads: &[Load],
    vehicle: &Vehicle,
    params: &DispatcherParams,
    initial: HosState,
) -> FeasibilityReport {
    let mut issues = Vec::new();
    let windows: HashMap<&str, (StopAction, DateTime<Utc>, DateTime<Utc>)> = loads
        .iter()
        .flat_map(|l| l.stops.iter())
        .filter_map(|s| {
            s.window
                .map(|w| (s.id.as_str(), (s.action, w.earliest, w.latest)))
        })
        .collect();

    let mut state = initial;
    let mut fuel_gal = vehicle.current_fuel_gal;
    let mut reported_clocks: Vec<&'static str> = Vec::new();
    let mut reported_dry_tank = false;

    for (index, seg) in segments.iter().enumerate() {
        match &seg.detail {
            SegmentDetail::Drive {
                distance_miles,
                drive_hours,
            } => {
                state = HosClock::apply_unchecked(&state, &Activity::driving(*drive_hours));
                fuel_gal -= distance_miles / vehicle.mpg;
                if fuel_gal < -1e-6 && !reported_dry_tank {
                    issues.push(format!(
                        "vehicle {} runs out of fuel during segment {}",
                        vehicle.id,
                        index + 1
                    ));
                    reported_dry_tank = true;
                }

                // The clocks forbid driving, so they are verified where
                // driving ends. Dock time may legally push the duty clock
                // past its limit as long as no drive follows before a rest.
                for (name, value, limit) in [
                    ("drive clock", state.hours_driven, DRIVE_LIMIT_HOURS),
                    ("duty clock", state.on_duty_hours, DUTY_LIMIT_HOURS),
                    ("break window", state.hours_since_break, BREAK_WINDOW_HOURS),
                    ("cycle clock", state.cycle_hours_used, CYCLE_LIMIT_HOURS),
                ] {
                    if value > limit + 1e-6 && !reported_clocks.contains(&name) {
                        issues.push(format!(
                            "{} exceeds {:.0}h limit ({:.2}h) after segment {} ({})",
                            name,
                            limit,
                            value,
                            index + 1,
                            seg.kind_name()
                        ));
                        reported_clocks.push(name);
                    }
                }
            }
            SegmentDetail::Dock {
                stop_id,
                estimated_hours,
                actual_hours,
                off_duty_qualifying,
                converted_to_rest,
                ..
            } => {
                let hours = actual_hours.unwrap_or(*estimated_hours);
                let activity = if *off_duty_qualifying {
                    Activity::off_duty(hours)
                } else {
                    Activity::on_duty(hours)
                };
                state = HosClock::apply_unchecked(&state, &activity);

                if *converted_to_rest && !off_duty_qualifying {
                    issues.push(format!(
                        "stop {}: dock time marked as rest credit but driver was on duty",
                        stop_id
                    ));
                }
                if let Some((StopAction::Delivery, _, latest)) =
                    windows.get(stop_id.as_str()).copied()
                {
                    if seg.start > latest {
                        issues.push(format!(
                            "delivery window missed at stop {}: arrival {} after window close {}",
                            stop_id,
                            seg.start.to_rfc3339(),
                            latest.to_rfc3339()
                        ));
                    }
                }
            }
            SegmentDetail::Rest { hours, .. } => {
                let activity = if *hours >= 7.0 {
                    Activity::sleeper(*hours)
                } else {
                    Activity::off_duty(*hours)
                };
                state = HosClock::apply_unchecked(&state, &activity);
            }
            SegmentDetail::Break { hours } => {
                state = HosClock::apply_unchecked(&state, &Activity::off_duty(*hours));
            }
            SegmentDetail::Fuel { detour_miles, gallons, .. } => {
                state =
                    HosClock::apply_unchecked(&state, &Activity::on_duty(seg.duration_hours()));
                fuel_gal = (fuel_gal - detour_miles / vehicle.mpg + gallons)
                    .min(vehicle.tank_capacity_gal);
                if *detour_miles > params.max_fuel_detour_miles + 1e-6 {
                    issues.push(format!(
                        "fuel detour of {:.1} mi exceeds dispatcher allowance of {:.1} mi",
                        detour_miles, params.max_fuel_detour_miles
                    ));
                }
            }
        }
    }

    FeasibilityReport {
        is_feasible: issues.is_empty(),
        issues,
    }
}
