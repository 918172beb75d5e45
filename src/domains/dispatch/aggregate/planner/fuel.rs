//! Fuel stop insertion. Tracks projected range across drive segments and
//! buys fuel before the tank would dip under the safety margin, preferring
//! the cheapest delivered price within the dispatcher's detour allowance.

use crate::common::DomainResult;
use crate::domains::dispatch::aggregate::planner::builder::hours_to_duration;
use crate::domains::dispatch::aggregate::planner::planner::PlannerConfig;
use crate::domains::dispatch::aggregate::segment::{RouteSegment, SegmentDetail};
use crate::domains::dispatch::aggregate::types::{DispatcherParams, Vehicle};
use crate::domains::dispatch::ports::FuelPriceProvider;
use ordered_float::OrderedFloat;
use std::collections::VecDeque;

const MILE_EPSILON: f64 = 1e-6;
const GALLON_EPSILON: f64 = 1e-9;

/// Fuel planning is allowed to come up short (no reachable station inside
/// the detour allowance); that is a feasibility issue on the plan, not a
/// planning error. Provider failures, by contrast, abort planning.
pub struct FuelPlanOutcome {
    pub segments: Vec<RouteSegment>,
    pub issues: Vec<String>,
}

pub fn insert_fuel_stops(
    segments: &[RouteSegment],
    vehicle: &Vehicle,
    params: &DispatcherParams,
    provider: &dyn FuelPriceProvider,
    cfg: &PlannerConfig,
) -> DomainResult<FuelPlanOutcome> {
    let total_drive_miles: f64 = segments
        .iter()
        .map(|s| match s.detail {
            SegmentDetail::Drive { distance_miles, .. } => distance_miles,
            _ => 0.0,
        })
        .sum();

    let stations = provider.stations_along(total_drive_miles)?;

    let mpg = vehicle.mpg;
    let margin_gal = cfg.fuel_safety_margin_miles / mpg;
    let mut fuel_gal = vehicle.current_fuel_gal;
    let mut route_mile = 0.0;
    let mut issues = Vec::new();
    let mut out = Vec::with_capacity(segments.len());

    let mut queue: VecDeque<RouteSegment> = segments.iter().cloned().collect();

    while let Some(seg) = queue.pop_front() {
        let (distance_miles, drive_hours) = match seg.detail {
            SegmentDetail::Drive {
                distance_miles,
                drive_hours,
            } => (distance_miles, drive_hours),
            _ => {
                if let SegmentDetail::Fuel { gallons, .. } = seg.detail {
                    // A stop kept from a previous pass still fills the tank.
                    fuel_gal = (fuel_gal + gallons).min(vehicle.tank_capacity_gal);
                }
                out.push(seg);
                continue;
            }
        };

        let burn = distance_miles / mpg;
        if fuel_gal - burn >= margin_gal - GALLON_EPSILON || distance_miles <= MILE_EPSILON {
            fuel_gal -= burn;
            route_mile += distance_miles;
            out.push(seg);
            continue;
        }

        // The tank would dip under the margin on this leg; fuel first.
        let reach_miles = ((fuel_gal - margin_gal) * mpg).max(0.0);
        let remaining_after = |station_mile: f64| total_drive_miles - station_mile;

        let pick = stations
            .iter()
            .filter(|st| {
                st.detour_miles <= params.max_fuel_detour_miles + MILE_EPSILON
                    && st.route_mile >= route_mile - MILE_EPSILON
                    && st.route_mile <= route_mile + reach_miles + MILE_EPSILON
            })
            .filter_map(|st| {
                let fuel_at_station =
                    fuel_gal - (st.route_mile - route_mile).max(0.0) / mpg - st.detour_miles / mpg;
                let need = (remaining_after(st.route_mile) + cfg.fuel_safety_margin_miles) / mpg;
                let gallons =
                    (need - fuel_at_station).min(vehicle.tank_capacity_gal - fuel_at_station);
                if gallons <= MILE_EPSILON {
                    return None;
                }
                // Delivered price folds the detour burn into the per-gallon cost.
                let detour_burn_cost = st.detour_miles / mpg * st.price_per_gallon;
                let delivered = st.price_per_gallon + detour_burn_cost / gallons;
                Some((st, gallons, fuel_at_station, delivered))
            })
            .min_by_key(|(st, _, _, delivered)| {
                (OrderedFloat(*delivered), OrderedFloat(st.detour_miles))
            });

        let (station, gallons, fuel_at_station, _) = match pick {
            Some(p) => p,
            None => {
                issues.push(format!(
                    "no fuel stop within {:.0} mi detour reachable near route mile {:.0}",
                    params.max_fuel_detour_miles, route_mile
                ));
                // Keep walking so the checker can report the dry tank too.
                fuel_gal -= burn;
                route_mile += distance_miles;
                out.push(seg);
                continue;
            }
        };

        let to_station = (station.route_mile - route_mile).max(0.0);
        if to_station > MILE_EPSILON {
            let hours = drive_hours * (to_station / distance_miles);
            let end = seg.start + hours_to_duration(hours);
            out.push(RouteSegment {
                start: seg.start,
                end,
                hos_after: seg.hos_after,
                detail: SegmentDetail::Drive {
                    distance_miles: to_station,
                    drive_hours: hours,
                },
            });
            fuel_gal -= to_station / mpg;
            route_mile += to_station;
        }

        fuel_gal = fuel_at_station.max(0.0) + gallons;
        let stop_start = out.last().map(|s| s.end).unwrap_or(seg.start);
        out.push(RouteSegment {
            start: stop_start,
            end: stop_start + hours_to_duration(cfg.fuel_stop_service_hours),
            hos_after: seg.hos_after,
            detail: SegmentDetail::Fuel {
                gallons,
                price_per_gallon: station.price_per_gallon,
                cost_estimate: gallons * station.price_per_gallon,
                detour_miles: station.detour_miles,
                station_name: station.name.clone(),
            },
        });

        let left = distance_miles - to_station;
        if left > MILE_EPSILON {
            let hours = drive_hours * (left / distance_miles);
            queue.push_front(RouteSegment {
                start: seg.start,
                end: seg.start + hours_to_duration(hours),
                hos_after: seg.hos_after,
                detail: SegmentDetail::Drive {
                    distance_miles: left,
                    drive_hours: hours,
                },
            });
        }
    }

    Ok(FuelPlanOutcome {
        segments: out,
        issues,
    })
}

/// Total purchased fuel cost across a segment list.
pub fn fuel_spend(segments: &[RouteSegment]) -> f64 {
    segments
        .iter()
        .map(|s| match &s.detail {
            SegmentDetail::Fuel { cost_estimate, .. } => *cost_estimate,
            _ => 0.0,
        })
        .sum()
}

/// Stations a plan ended up buying from, for logging and the plan summary.
pub fn stations_used(segments: &[RouteSegment]) -> Vec<String> {
    segments
        .iter()
        .filter_map(|s| match &s.detail {
            SegmentDetail::Fuel { station_name, .. } => Some(station_name.clone()),
            _ => None,
        })
        .collect()
}
