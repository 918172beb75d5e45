use crate::domains::monitoring::triggers::{Alert, Trigger, TriggerType};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Open-condition bookkeeping that makes ticks idempotent. A condition is
/// identified by `(plan_id, trigger_type, open_since)`; while it stays open,
/// repeated or duplicated ticks never raise a second alert for it.
#[derive(Debug, Default)]
pub struct TriggerLedger {
    open: HashMap<(String, TriggerType), OpenCondition>,
}

#[derive(Debug, Clone)]
pub struct OpenCondition {
    pub open_since: DateTime<Utc>,
    pub alert_id: Uuid,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TickOutcome {
    pub new_alerts: Vec<Alert>,
    pub resolved_alert_ids: Vec<Uuid>,
}

impl TriggerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick's triggers for a plan: conditions seen for the first
    /// time produce alerts, conditions that stopped firing resolve, and
    /// everything else is a no-op.
    pub fn reconcile(&mut self, plan_id: &str, fired: &[Trigger], now: DateTime<Utc>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let fired_types: HashSet<TriggerType> = fired.iter().map(|t| t.trigger_type).collect();

        for trigger in fired {
            let key = (plan_id.to_string(), trigger.trigger_type);
            match self.open.get_mut(&key) {
                Some(condition) => {
                    condition.last_seen = now;
                }
                None => {
                    let alert = Alert::from_trigger(trigger, trigger.observed_at);
                    self.open.insert(
                        key,
                        OpenCondition {
                            open_since: trigger.observed_at,
                            alert_id: alert.id,
                            last_seen: now,
                        },
                    );
                    outcome.new_alerts.push(alert);
                }
            }
        }

        let stale: Vec<(String, TriggerType)> = self
            .open
            .keys()
            .filter(|(pid, ty)| pid == plan_id && !fired_types.contains(ty))
            .cloned()
            .collect();
        for key in stale {
            if let Some(condition) = self.open.remove(&key) {
                outcome.resolved_alert_ids.push(condition.alert_id);
            }
        }

        outcome
    }

    /// Forget one open condition so the next tick re-raises it. Used when
    /// alert delivery ultimately failed; the condition must not vanish.
    pub fn forget(&mut self, plan_id: &str, trigger_type: TriggerType) {
        self.open.remove(&(plan_id.to_string(), trigger_type));
    }

    /// Teardown for a plan leaving Active; drops its open conditions.
    pub fn drop_plan(&mut self, plan_id: &str) {
        self.open.retain(|(pid, _), _| pid != plan_id);
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn open_since(&self, plan_id: &str, trigger_type: TriggerType) -> Option<DateTime<Utc>> {
        self.open
            .get(&(plan_id.to_string(), trigger_type))
            .map(|c| c.open_since)
    }
}
