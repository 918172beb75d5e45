//! Draft segment construction: ordered stops plus routing estimates become
//! an alternating drive/dock list. No rest, break or fuel segments yet and
//! no HOS annotation; downstream passes add both.

use crate::common::{DomainError, DomainResult};
use crate::domains::dispatch::aggregate::segment::{RouteSegment, SegmentDetail};
use crate::domains::dispatch::aggregate::types::{GeoPoint, Load, Stop};
use crate::domains::dispatch::ports::RoutingProvider;
use crate::domains::hos::HosState;
use chrono::{DateTime, Duration, Utc};

/// Flatten loads into one visit order. Stops keep their dispatcher-assigned
/// sequence; ties fall back to stop id so the order is deterministic.
pub fn visit_order(loads: &[Load]) -> DomainResult<Vec<Stop>> {
    let mut stops: Vec<Stop> = loads.iter().flat_map(|l| l.stops.iter().cloned()).collect();
    if stops.is_empty() {
        return Err(DomainError::InvalidCommand {
            reason: "no stops on any load".to_string(),
        });
    }
    stops.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.id.cmp(&b.id)));
    Ok(stops)
}

pub fn build_draft(
    stops: &[Stop],
    origin: Option<GeoPoint>,
    departure: DateTime<Utc>,
    routing: &dyn RoutingProvider,
) -> DomainResult<Vec<RouteSegment>> {
    let mut segments = Vec::new();
    let mut cursor = departure;
    let mut previous: Option<GeoPoint> = origin;

    for stop in stops {
        if let Some(from) = previous {
            let leg = routing.estimate_leg(&from, &stop.location)?;
            let end = cursor + hours_to_duration(leg.drive_hours);
            segments.push(RouteSegment {
                start: cursor,
                end,
                hos_after: HosState::fresh(),
                detail: SegmentDetail::Drive {
                    distance_miles: leg.distance_miles,
                    drive_hours: leg.drive_hours,
                },
            });
            cursor = end;
        }

        let end = cursor + hours_to_duration(stop.dock_estimate_hours);
        segments.push(RouteSegment {
            start: cursor,
            end,
            hos_after: HosState::fresh(),
            detail: SegmentDetail::Dock {
                stop_id: stop.id.clone(),
                action: stop.action,
                estimated_hours: stop.dock_estimate_hours,
                actual_hours: None,
                off_duty_qualifying: stop.off_duty_qualifying,
                converted_to_rest: false,
            },
        });
        cursor = end;
        previous = Some(stop.location);
    }

    Ok(segments)
}

pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}
