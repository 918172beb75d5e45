use serde::{Deserialize, Serialize};

/// Regulatory clock limits, in hours. These are regulation, not configuration.
pub const DRIVE_LIMIT_HOURS: f64 = 11.0;
pub const DUTY_LIMIT_HOURS: f64 = 14.0;
pub const BREAK_WINDOW_HOURS: f64 = 8.0;
pub const CYCLE_LIMIT_HOURS: f64 = 70.0;

pub const BREAK_MIN_HOURS: f64 = 0.5;
pub const FULL_REST_MIN_HOURS: f64 = 10.0;

/// Qualifying durations for the two split-sleeper patterns.
pub const SPLIT_LONG_8: f64 = 8.0;
pub const SPLIT_SHORT_2: f64 = 2.0;
pub const SPLIT_LONG_7: f64 = 7.0;
pub const SPLIT_SHORT_3: f64 = 3.0;

pub const CLOCK_EPSILON: f64 = 1e-9;

/// Snapshot of a driver's HOS clocks. Immutable value; `HosClock::apply`
/// returns a new snapshot rather than mutating in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HosState {
    /// Driving hours since the last qualifying drive-clock reset
    pub hours_driven: f64,
    /// On-duty hours since the last off-duty period that reset the duty clock
    pub on_duty_hours: f64,
    /// Hours since the last 30-minute break
    pub hours_since_break: f64,
    /// Rolling 7/8-day on-duty total, seeded from the driver's ELD history
    pub cycle_hours_used: f64,
    /// Open half of a split-sleeper pair, if one is pending
    pub split_credit: Option<SplitCredit>,
}

/// One completed half of a split-sleeper pair. The drive/duty clocks reset
/// only once the second qualifying period closes the pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitCredit {
    pub rest_hours: f64,
}

impl HosState {
    /// All clocks at zero, no pending split credit.
    pub fn fresh() -> Self {
        Self {
            hours_driven: 0.0,
            on_duty_hours: 0.0,
            hours_since_break: 0.0,
            cycle_hours_used: 0.0,
            split_credit: None,
        }
    }

    /// Fresh daily clocks with the cycle seeded from recent driver history.
    pub fn seeded(cycle_hours_used: f64) -> Self {
        Self {
            cycle_hours_used,
            ..Self::fresh()
        }
    }

    /// Largest continuous drive permitted by the drive, duty and cycle clocks.
    /// The break window is tracked separately because a 30-minute break is a
    /// much cheaper remedy than a rest period.
    pub fn drive_headroom(&self) -> f64 {
        let drive = DRIVE_LIMIT_HOURS - self.hours_driven;
        let duty = DUTY_LIMIT_HOURS - self.on_duty_hours;
        let cycle = CYCLE_LIMIT_HOURS - self.cycle_hours_used;
        drive.min(duty).min(cycle).max(0.0)
    }

    pub fn break_headroom(&self) -> f64 {
        (BREAK_WINDOW_HOURS - self.hours_since_break).max(0.0)
    }

    pub fn within_limits(&self) -> bool {
        self.hours_driven <= DRIVE_LIMIT_HOURS + CLOCK_EPSILON
            && self.on_duty_hours <= DUTY_LIMIT_HOURS + CLOCK_EPSILON
            && self.hours_since_break <= BREAK_WINDOW_HOURS + CLOCK_EPSILON
            && self.cycle_hours_used <= CYCLE_LIMIT_HOURS + CLOCK_EPSILON
    }
}

impl Default for HosState {
    fn default() -> Self {
        Self::fresh()
    }
}
