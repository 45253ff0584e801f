use async_trait::async_trait;
use chrono::{DateTime, Utc};
use storefront_core::{Money, ReturnItem, ReturnRequest, ReturnStatus};
use uuid::Uuid;

use crate::Result;

/// Refund-related columns of a return, written together.
///
/// `None` clears the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnUpdate {
    /// When set, the update only applies while the stored status is still
    /// this one.
    pub expected_status: Option<ReturnStatus>,
    pub status: ReturnStatus,
    pub refund_amount: Option<Money>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

#[async_trait]
pub trait ReturnRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find_return(&self, tenant_id: &str, return_id: Uuid) -> Result<Option<ReturnRequest>>;

    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list_return_items(
        &self,
        tenant_id: &str,
        return_id: Uuid,
    ) -> Result<Vec<ReturnItem>>;

    /// Update a return scoped to tenant and id, returning the new row.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotFound` if the tenant has no such return,
    /// and `WorkflowError::InvalidState` if `update.expected_status` no
    /// longer matches. The check and the write must be atomic.
    async fn update_return(
        &self,
        tenant_id: &str,
        return_id: Uuid,
        update: ReturnUpdate,
    ) -> Result<ReturnRequest>;
}
