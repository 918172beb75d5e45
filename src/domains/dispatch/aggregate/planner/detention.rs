//! Dock-overage arithmetic shared by rest-credit conversion and detention
//! billing. Both features must price the same hour the same way, so the
//! free-time constant and the overage formula live here and nowhere else.

/// Free dock time beyond the appointment estimate before overage accrues.
pub const DOCK_FREE_OVERAGE_HOURS: f64 = 2.0;

/// Hours beyond `estimate + free allowance`. Zero when the dock ran on time
/// or within the allowance.
pub fn dock_overage_hours(estimated_hours: f64, actual_hours: f64) -> f64 {
    (actual_hours - estimated_hours - DOCK_FREE_OVERAGE_HOURS).max(0.0)
}

/// Detention billed to the shipper, in hours. Same formula as the planner's
/// rest-credit conversion; invoicing consumes this directly.
pub fn billable_detention_hours(estimated_hours: f64, actual_hours: f64) -> f64 {
    dock_overage_hours(estimated_hours, actual_hours)
}

pub fn detention_charge(estimated_hours: f64, actual_hours: f64, hourly_rate: f64) -> f64 {
    billable_detention_hours(estimated_hours, actual_hours) * hourly_rate
}
