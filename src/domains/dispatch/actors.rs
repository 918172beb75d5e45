// Dispatch command actor - forwards monitoring decisions to the orchestrator
use crate::domains::dispatch::events::DispatchEvent;
use crate::domains::monitoring::triggers::{Alert, TriggerType};
use tokio::sync::mpsc;

pub struct DispatchCommandActor {
    event_sender: mpsc::Sender<DispatchEvent>,
}

impl DispatchCommandActor {
    pub fn new(event_sender: mpsc::Sender<DispatchEvent>) -> Self {
        Self { event_sender }
    }

    pub async fn recommend_replan(
        &self,
        dispatcher_id: String,
        plan_id: String,
        trigger_type: TriggerType,
    ) -> Result<(), String> {
        let event = DispatchEvent::ReplanRecommended {
            dispatcher_id,
            plan_id,
            trigger_type,
            timestamp: chrono::Utc::now(),
        };
        self.event_sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    pub async fn raise_alert(&self, dispatcher_id: String, alert: Alert) -> Result<(), String> {
        let event = DispatchEvent::AlertRaised {
            dispatcher_id,
            alert: Box::new(alert),
            timestamp: chrono::Utc::now(),
        };
        self.event_sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}
