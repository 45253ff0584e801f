use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `payload` under `event_name` for `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::EventBus` if the event cannot be handed to the bus.
    async fn publish(
        &self,
        event_name: &str,
        tenant_id: &str,
        payload: serde_json::Value,
    ) -> Result<()>;
}
