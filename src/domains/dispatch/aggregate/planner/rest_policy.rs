//! Rest and break insertion. Walks the segment list left to right with a
//! running HOS state, splitting drive legs and inserting break/rest segments
//! wherever a clock would otherwise trip. Deterministic and idempotent:
//! running the policy over its own output changes nothing.

use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::planner::builder::hours_to_duration;
use crate::domains::dispatch::aggregate::planner::detention::dock_overage_hours;
use crate::domains::dispatch::aggregate::planner::planner::PlannerConfig;
use crate::domains::dispatch::aggregate::segment::{
    RestReason, RestType, RouteSegment, SegmentDetail,
};
use crate::domains::dispatch::aggregate::types::{
    DispatcherParams, OptimizationPriority, PreferredRest,
};
use crate::domains::hos::{
    Activity, HosClock, HosState, BREAK_MIN_HOURS, CYCLE_LIMIT_HOURS, DRIVE_LIMIT_HOURS,
    FULL_REST_MIN_HOURS, SPLIT_LONG_7, SPLIT_LONG_8, SPLIT_SHORT_2, SPLIT_SHORT_3,
};
use chrono::{DateTime, Utc};

const TIME_EPSILON: f64 = 1e-6;

pub fn insert_rest_and_breaks(
    segments: &[RouteSegment],
    initial: HosState,
    departure: DateTime<Utc>,
    params: &DispatcherParams,
    priority: OptimizationPriority,
    cfg: &PlannerConfig,
) -> DomainResult<Vec<RouteSegment>> {
    let mut walk = Walk {
        out: Vec::with_capacity(segments.len()),
        state: initial,
        cursor: departure,
    };

    for seg in segments {
        match &seg.detail {
            SegmentDetail::Drive {
                distance_miles,
                drive_hours,
            } => walk.drive(*distance_miles, *drive_hours, params, priority, cfg)?,
            SegmentDetail::Dock {
                stop_id,
                action,
                estimated_hours,
                actual_hours,
                off_duty_qualifying,
                ..
            } => walk.dock(
                stop_id,
                *action,
                *estimated_hours,
                *actual_hours,
                *off_duty_qualifying,
            ),
            SegmentDetail::Rest {
                hours,
                rest_type,
                reason,
            } => walk.rest(*hours, *rest_type, *reason),
            SegmentDetail::Break { hours } => walk.take_break(*hours),
            SegmentDetail::Fuel { .. } => walk.fuel(seg),
        }
    }

    Ok(walk.out)
}

struct Walk {
    out: Vec<RouteSegment>,
    state: HosState,
    cursor: DateTime<Utc>,
}

impl Walk {
    fn push(&mut self, hours: f64, detail: SegmentDetail) {
        let start = self.cursor;
        let end = start + hours_to_duration(hours);
        self.out.push(RouteSegment {
            start,
            end,
            hos_after: self.state,
            detail,
        });
        self.cursor = end;
    }

    fn drive(
        &mut self,
        distance_miles: f64,
        drive_hours: f64,
        params: &DispatcherParams,
        priority: OptimizationPriority,
        cfg: &PlannerConfig,
    ) -> DomainResult<()> {
        if drive_hours <= TIME_EPSILON {
            return Ok(());
        }
        let miles_per_hour = distance_miles / drive_hours;
        let mut remaining = drive_hours;

        while remaining > TIME_EPSILON {
            let drive_room = self.state.drive_headroom();
            let break_room = self.state.break_headroom();
            let chunk = remaining.min(drive_room).min(break_room);

            if chunk <= TIME_EPSILON {
                if drive_room <= TIME_EPSILON {
                    if CYCLE_LIMIT_HOURS - self.state.cycle_hours_used <= TIME_EPSILON {
                        // No in-plan mechanism restores cycle hours; the
                        // 34-hour restart is an external input.
                        return Err(DomainError::ClockViolation {
                            clock: "cycle clock".to_string(),
                            limit_hours: CYCLE_LIMIT_HOURS,
                            detail: "cycle hours exhausted before route completion".to_string(),
                        });
                    }
                    for (hours, rest_type, reason) in
                        choose_rest(&self.state, params.preferred_rest_type, priority, cfg)
                    {
                        self.rest(hours, rest_type, reason);
                    }
                } else {
                    self.take_break(BREAK_MIN_HOURS);
                }
                continue;
            }

            self.state = HosClock::apply(&self.state, &Activity::driving(chunk))?;
            self.push(
                chunk,
                SegmentDetail::Drive {
                    distance_miles: miles_per_hour * chunk,
                    drive_hours: chunk,
                },
            );
            remaining -= chunk;
        }
        Ok(())
    }

    fn dock(
        &mut self,
        stop_id: &str,
        action: crate::domains::dispatch::aggregate::types::StopAction,
        estimated_hours: f64,
        actual_hours: Option<f64>,
        off_duty_qualifying: bool,
    ) {
        let hours = actual_hours.unwrap_or(estimated_hours);
        let converted = off_duty_qualifying
            && actual_hours
                .map(|actual| dock_overage_hours(estimated_hours, actual) >= BREAK_MIN_HOURS)
                .unwrap_or(false);

        let activity = if off_duty_qualifying {
            Activity::off_duty(hours)
        } else {
            Activity::on_duty(hours)
        };
        self.state = HosClock::apply_unchecked(&self.state, &activity);

        self.push(
            hours,
            SegmentDetail::Dock {
                stop_id: stop_id.to_string(),
                action,
                estimated_hours,
                actual_hours,
                off_duty_qualifying,
                converted_to_rest: converted,
            },
        );
    }

    fn rest(&mut self, hours: f64, rest_type: RestType, reason: RestReason) {
        let activity = if hours >= SPLIT_LONG_7 {
            Activity::sleeper(hours)
        } else {
            Activity::off_duty(hours)
        };
        self.state = HosClock::apply_unchecked(&self.state, &activity);
        self.push(
            hours,
            SegmentDetail::Rest {
                hours,
                rest_type,
                reason,
            },
        );
    }

    fn take_break(&mut self, hours: f64) {
        self.state = HosClock::apply_unchecked(&self.state, &Activity::off_duty(hours));
        self.push(hours, SegmentDetail::Break { hours });
    }

    fn fuel(&mut self, seg: &RouteSegment) {
        let hours = seg.duration_hours();
        self.state = HosClock::apply_unchecked(&self.state, &Activity::on_duty(hours));
        self.push(hours, seg.detail.clone());
    }
}

/// Pick the rest segments to insert when the drive or duty clock trips.
/// Returns one or two (hours, type, reason) entries; two when a split pair
/// must be taken back to back.
fn choose_rest(
    state: &HosState,
    preferred: PreferredRest,
    priority: OptimizationPriority,
    cfg: &PlannerConfig,
) -> Vec<(f64, RestType, RestReason)> {
    let reason = if state.hours_driven >= DRIVE_LIMIT_HOURS - TIME_EPSILON {
        RestReason::DriveLimit
    } else {
        RestReason::DutyLimit
    };

    match preferred {
        PreferredRest::Full => vec![(FULL_REST_MIN_HOURS, RestType::Full, reason)],
        PreferredRest::Split8_2 => {
            split_pair(state, SPLIT_LONG_8, SPLIT_SHORT_2, RestType::Split8_2, reason)
        }
        PreferredRest::Split7_3 => {
            split_pair(state, SPLIT_LONG_7, SPLIT_SHORT_3, RestType::Split7_3, reason)
        }
        PreferredRest::Auto => {
            if let Some(credit) = state.split_credit {
                if let Some((hours, rest_type)) = cheapest_closing(credit.rest_hours, cfg) {
                    let saving = FULL_REST_MIN_HOURS - hours;
                    if saving >= auto_split_min_saving(priority) {
                        return vec![(hours, rest_type, reason)];
                    }
                }
            }
            vec![(FULL_REST_MIN_HOURS, RestType::Full, reason)]
        }
    }
}

fn split_pair(
    state: &HosState,
    long: f64,
    short: f64,
    rest_type: RestType,
    reason: RestReason,
) -> Vec<(f64, RestType, RestReason)> {
    if let Some(credit) = state.split_credit {
        if HosClock::split_pair_qualifies(credit.rest_hours, short) {
            return vec![(short, rest_type, reason)];
        }
        if HosClock::split_pair_qualifies(credit.rest_hours, long) {
            return vec![(long, rest_type, reason)];
        }
    }
    vec![(long, rest_type, reason), (short, rest_type, reason)]
}

/// Shortest off-duty period that closes the open split credit, honoring the
/// configured pattern preference when both patterns qualify.
fn cheapest_closing(credit_hours: f64, cfg: &PlannerConfig) -> Option<(f64, RestType)> {
    let candidates = match cfg.auto_split_preference {
        RestType::Split7_3 => [
            (SPLIT_SHORT_3, RestType::Split7_3),
            (SPLIT_SHORT_2, RestType::Split8_2),
            (SPLIT_LONG_7, RestType::Split7_3),
            (SPLIT_LONG_8, RestType::Split8_2),
        ],
        _ => [
            (SPLIT_SHORT_2, RestType::Split8_2),
            (SPLIT_SHORT_3, RestType::Split7_3),
            (SPLIT_LONG_8, RestType::Split8_2),
            (SPLIT_LONG_7, RestType::Split7_3),
        ],
    };
    candidates
        .iter()
        .find(|(hours, _)| HosClock::split_pair_qualifies(credit_hours, *hours))
        .copied()
}

/// How many hours a split must save over a full rest before `Auto` takes it.
fn auto_split_min_saving(priority: OptimizationPriority) -> f64 {
    match priority {
        OptimizationPriority::MinimizeTime => 0.5,
        OptimizationPriority::Balance => 1.0,
        OptimizationPriority::MinimizeCost => 2.0,
    }
}
