use crate::domains::dispatch::aggregate::types::StopAction;
use crate::domains::hos::HosState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a rest segment was inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestReason {
    DriveLimit,
    DutyLimit,
    DockConversion,
}

/// How an inserted rest segment satisfies the reset rules. `Auto` preference
/// resolves to one of these before a segment is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestType {
    Full,
    Split8_2,
    Split7_3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SegmentDetail {
    Drive {
        distance_miles: f64,
        drive_hours: f64,
    },
    Dock {
        stop_id: String,
        action: StopAction,
        estimated_hours: f64,
        actual_hours: Option<f64>,
        off_duty_qualifying: bool,
        /// Dock overage beyond the free allowance credited as rest instead
        /// of a separate rest segment
        converted_to_rest: bool,
    },
    Rest {
        hours: f64,
        rest_type: RestType,
        reason: RestReason,
    },
    Fuel {
        gallons: f64,
        price_per_gallon: f64,
        cost_estimate: f64,
        detour_miles: f64,
        station_name: String,
    },
    Break {
        hours: f64,
    },
}

/// One timed slice of a plan. Segments are ordered, owned by their plan, and
/// immutable once the plan leaves Draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub hos_after: HosState,
    pub detail: SegmentDetail,
}

impl RouteSegment {
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.detail {
            SegmentDetail::Drive { .. } => "drive",
            SegmentDetail::Dock { .. } => "dock",
            SegmentDetail::Rest { .. } => "rest",
            SegmentDetail::Fuel { .. } => "fuel",
            SegmentDetail::Break { .. } => "break",
        }
    }

    pub fn is_drive(&self) -> bool {
        matches!(self.detail, SegmentDetail::Drive { .. })
    }

    pub fn distance_miles(&self) -> f64 {
        match &self.detail {
            SegmentDetail::Drive { distance_miles, .. } => *distance_miles,
            SegmentDetail::Fuel { detour_miles, .. } => *detour_miles,
            _ => 0.0,
        }
    }
}
