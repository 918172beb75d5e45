use crate::common::{DomainError, DomainResult};
use crate::domains::hos::state::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivityKind {
    Driving,
    /// On duty, not driving: dock work, fuel stops, inspections
    OnDuty,
    OffDuty,
    Sleeper,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub hours: f64,
}

impl Activity {
    pub fn driving(hours: f64) -> Self {
        Self { kind: ActivityKind::Driving, hours }
    }
    pub fn on_duty(hours: f64) -> Self {
        Self { kind: ActivityKind::OnDuty, hours }
    }
    pub fn off_duty(hours: f64) -> Self {
        Self { kind: ActivityKind::OffDuty, hours }
    }
    pub fn sleeper(hours: f64) -> Self {
        Self { kind: ActivityKind::Sleeper, hours }
    }
}

/// Which clock a proposed activity would violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockKind {
    BreakWindow,
    Drive,
    Duty,
    Cycle,
}

impl ClockKind {
    pub fn limit_hours(&self) -> f64 {
        match self {
            ClockKind::BreakWindow => BREAK_WINDOW_HOURS,
            ClockKind::Drive => DRIVE_LIMIT_HOURS,
            ClockKind::Duty => DUTY_LIMIT_HOURS,
            ClockKind::Cycle => CYCLE_LIMIT_HOURS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClockKind::BreakWindow => "break window",
            ClockKind::Drive => "drive clock",
            ClockKind::Duty => "duty clock",
            ClockKind::Cycle => "cycle clock",
        }
    }
}

/// Pure HOS clock arithmetic. No I/O; every function takes a state and
/// returns a new one or a rejection naming the violated clock.
pub struct HosClock;

impl HosClock {
    /// Apply a proposed activity, returning the state after it completes or
    /// a `ClockViolation` if the activity is forbidden from this state.
    pub fn apply(state: &HosState, activity: &Activity) -> DomainResult<HosState> {
        match activity.kind {
            ActivityKind::Driving => Self::apply_driving(state, activity.hours),
            ActivityKind::OnDuty => Ok(Self::apply_on_duty(state, activity.hours)),
            ActivityKind::OffDuty | ActivityKind::Sleeper => {
                Ok(Self::apply_off_duty(state, activity.hours))
            }
        }
    }

    /// The clock a continuous drive of `hours` would violate first, if any.
    /// Checks run strictest-first: the break window trips before the daily
    /// clocks, the daily clocks before the cycle.
    pub fn would_violate_driving(state: &HosState, hours: f64) -> Option<ClockKind> {
        if state.hours_since_break + hours > BREAK_WINDOW_HOURS + CLOCK_EPSILON {
            return Some(ClockKind::BreakWindow);
        }
        if state.hours_driven + hours > DRIVE_LIMIT_HOURS + CLOCK_EPSILON {
            return Some(ClockKind::Drive);
        }
        if state.on_duty_hours + hours > DUTY_LIMIT_HOURS + CLOCK_EPSILON {
            return Some(ClockKind::Duty);
        }
        if state.cycle_hours_used + hours > CYCLE_LIMIT_HOURS + CLOCK_EPSILON {
            return Some(ClockKind::Cycle);
        }
        None
    }

    fn apply_driving(state: &HosState, hours: f64) -> DomainResult<HosState> {
        if let Some(clock) = Self::would_violate_driving(state, hours) {
            return Err(DomainError::ClockViolation {
                clock: clock.name().to_string(),
                limit_hours: clock.limit_hours(),
                detail: format!("driving {:.2}h from this state", hours),
            });
        }
        Ok(HosState {
            hours_driven: state.hours_driven + hours,
            on_duty_hours: state.on_duty_hours + hours,
            hours_since_break: state.hours_since_break + hours,
            cycle_hours_used: state.cycle_hours_used + hours,
            split_credit: state.split_credit,
        })
    }

    /// On-duty non-driving time is never forbidden outright; it burns the
    /// duty, break and cycle clocks so that subsequent driving may be.
    fn apply_on_duty(state: &HosState, hours: f64) -> HosState {
        HosState {
            hours_driven: state.hours_driven,
            on_duty_hours: state.on_duty_hours + hours,
            hours_since_break: state.hours_since_break + hours,
            cycle_hours_used: state.cycle_hours_used + hours,
            split_credit: state.split_credit,
        }
    }

    fn apply_off_duty(state: &HosState, hours: f64) -> HosState {
        let mut next = *state;

        if hours >= FULL_REST_MIN_HOURS - CLOCK_EPSILON {
            next.hours_driven = 0.0;
            next.on_duty_hours = 0.0;
            next.hours_since_break = 0.0;
            next.split_credit = None;
            return next;
        }

        // Split-sleeper pairing. A period >= 2h can stand as one half of a
        // pair; the drive/duty clocks reset only when the completed pair
        // qualifies as 8+2 or 7+3 (in either order).
        match state.split_credit {
            Some(credit) if Self::pair_qualifies(credit.rest_hours, hours) => {
                next.hours_driven = 0.0;
                next.on_duty_hours = 0.0;
                next.hours_since_break = 0.0;
                next.split_credit = None;
                return next;
            }
            Some(credit) => {
                if hours >= SPLIT_SHORT_2 - CLOCK_EPSILON && hours > credit.rest_hours {
                    next.split_credit = Some(SplitCredit { rest_hours: hours });
                }
            }
            None => {
                if hours >= SPLIT_SHORT_2 - CLOCK_EPSILON {
                    next.split_credit = Some(SplitCredit { rest_hours: hours });
                }
            }
        }

        if hours >= BREAK_MIN_HOURS - CLOCK_EPSILON {
            next.hours_since_break = 0.0;
        }

        next
    }

    /// True when two off-duty periods together satisfy a split pattern,
    /// in either order.
    pub fn split_pair_qualifies(first: f64, second: f64) -> bool {
        Self::pair_qualifies(first, second)
    }

    /// Same arithmetic as `apply`, but driving is never rejected. Used by the
    /// feasibility checker, which records violations instead of refusing to
    /// walk past them.
    pub fn apply_unchecked(state: &HosState, activity: &Activity) -> HosState {
        match activity.kind {
            ActivityKind::Driving => HosState {
                hours_driven: state.hours_driven + activity.hours,
                on_duty_hours: state.on_duty_hours + activity.hours,
                hours_since_break: state.hours_since_break + activity.hours,
                cycle_hours_used: state.cycle_hours_used + activity.hours,
                split_credit: state.split_credit,
            },
            ActivityKind::OnDuty => Self::apply_on_duty(state, activity.hours),
            ActivityKind::OffDuty | ActivityKind::Sleeper => {
                Self::apply_off_duty(state, activity.hours)
            }
        }
    }

    fn pair_qualifies(first: f64, second: f64) -> bool {
        let long = first.max(second);
        let short = first.min(second);
        (long >= SPLIT_LONG_8 - CLOCK_EPSILON && short >= SPLIT_SHORT_2 - CLOCK_EPSILON)
            || (long >= SPLIT_LONG_7 - CLOCK_EPSILON && short >= SPLIT_SHORT_3 - CLOCK_EPSILON)
    }

    /// Run a whole timeline from `initial`, returning the state after each
    /// entry. Stops at the first forbidden activity.
    pub fn replay(initial: &HosState, timeline: &[Activity]) -> DomainResult<Vec<HosState>> {
        let mut states = Vec::with_capacity(timeline.len());
        let mut current = *initial;
        for activity in timeline {
            current = Self::apply(&current, activity)?;
            states.push(current);
        }
        Ok(states)
    }
}
