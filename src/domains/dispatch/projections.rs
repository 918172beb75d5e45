use crate::common::EventEnvelope;
use serde::{Deserialize, Serialize};

/// Read-model counters for the dispatch board, folded from event envelopes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchBoardProjection {
    pub dispatcher_id: String,
    pub plans_generated: usize,
    pub plans_activated: usize,
    pub plans_completed: usize,
    pub plans_cancelled: usize,
    pub alerts_raised: usize,
    pub alerts_resolved: usize,
    pub replans_recommended: usize,
}

impl DispatchBoardProjection {
    pub fn new(dispatcher_id: String) -> Self {
        Self {
            dispatcher_id,
            ..Self::default()
        }
    }

    pub fn apply_envelope(&mut self, envelope: &EventEnvelope) {
        match envelope.event_type.as_str() {
            "PlanGenerated" => self.plans_generated += 1,
            "PlanActivated" => self.plans_activated += 1,
            "PlanCompleted" => self.plans_completed += 1,
            "PlanCancelled" | "PlanDeactivated" => self.plans_cancelled += 1,
            "AlertRaised" => self.alerts_raised += 1,
            "AlertResolved" => self.alerts_resolved += 1,
            "ReplanRecommended" => self.replans_recommended += 1,
            _ => {}
        }
    }
}
