use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{Money, RefundMethod, ReturnItem, ReturnRequest, ReturnStatus};
use uuid::Uuid;

/// Caller-supplied refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundInput {
    pub return_id: Uuid,
    pub refund_amount: Money,
    /// Defaults to the method recorded on the return.
    #[serde(default)]
    pub refund_method: Option<RefundMethod>,
    /// Defaults to `restore_inventory_by_default` from configuration.
    #[serde(default)]
    pub restore_inventory: Option<bool>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl RefundInput {
    #[must_use]
    pub fn new(return_id: Uuid, refund_amount: Money) -> Self {
        Self {
            return_id,
            refund_amount,
            refund_method: None,
            restore_inventory: None,
            admin_notes: None,
        }
    }

    #[must_use]
    pub fn with_refund_method(mut self, method: RefundMethod) -> Self {
        self.refund_method = Some(method);
        self
    }

    #[must_use]
    pub fn with_restore_inventory(mut self, restore: bool) -> Self {
        self.restore_inventory = Some(restore);
        self
    }

    #[must_use]
    pub fn with_admin_notes(mut self, notes: impl Into<String>) -> Self {
        self.admin_notes = Some(notes.into());
        self
    }
}

/// One stock increment applied while restoring inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryRestoration {
    pub product_id: Uuid,
    pub quantity: i64,
    pub previous_quantity: i64,
}

/// Refund columns of a return as they were before the status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousReturnState {
    pub return_id: Uuid,
    pub status: ReturnStatus,
    pub refund_amount: Option<Money>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

impl PreviousReturnState {
    pub(crate) fn of(request: &ReturnRequest) -> Self {
        Self {
            return_id: request.id,
            status: request.status,
            refund_amount: request.refund_amount,
            refunded_at: request.refunded_at,
            admin_notes: request.admin_notes.clone(),
        }
    }
}

/// Data threaded through the refund steps after validation.
#[derive(Debug, Clone)]
pub struct RefundSagaData {
    /// The return as loaded by validation, before any write.
    pub return_request: ReturnRequest,
    pub items: Vec<ReturnItem>,
    pub refund_amount: Money,
    pub refund_method: RefundMethod,
    pub restore_inventory: bool,
    pub admin_notes: Option<String>,
    pub restored_inventory: Vec<InventoryRestoration>,
    pub store_credit_id: Option<Uuid>,
    pub updated_return: Option<ReturnRequest>,
}

/// Result of a successful refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundOutcome {
    pub return_id: Uuid,
    pub return_number: String,
    pub status: ReturnStatus,
    pub refund_amount: Money,
    pub refund_method: RefundMethod,
    pub refunded_at: Option<DateTime<Utc>>,
    pub restored_inventory: Vec<InventoryRestoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_credit_id: Option<Uuid>,
}

impl From<RefundSagaData> for RefundOutcome {
    fn from(data: RefundSagaData) -> Self {
        let request = data.updated_return.unwrap_or(data.return_request);
        Self {
            return_id: request.id,
            return_number: request.return_number,
            status: request.status,
            refund_amount: data.refund_amount,
            refund_method: data.refund_method,
            refunded_at: request.refunded_at,
            restored_inventory: data.restored_inventory,
            store_credit_id: data.store_credit_id,
        }
    }
}
