//! Broadcast event publisher for domain events.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers
//! is not an error: the event bus is fire-and-forget.

use async_trait::async_trait;
use storefront_core::DomainEvent;
use tokio::sync::broadcast;
use tracing::debug;

use crate::Result;
use crate::traits::EventPublisher;

pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventPublisher {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new subscriber that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for BroadcastEventPublisher {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for BroadcastEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastEventPublisher")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(
        &self,
        event_name: &str,
        tenant_id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        let event = DomainEvent {
            name: event_name.to_string(),
            tenant_id: tenant_id.to_string(),
            payload,
        };
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = event_name, tenant_id, receivers, "published event"),
            Err(_) => debug!(event = event_name, tenant_id, "no subscribers, event dropped"),
        }
        Ok(())
    }
}
