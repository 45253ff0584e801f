use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Requested,
    Approved,
    Rejected,
    Received,
    Refunded,
    Cancelled,
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Received => "received",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    OriginalPayment,
    StoreCredit,
    Manual,
}

impl fmt::Display for RefundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OriginalPayment => "original_payment",
            Self::StoreCredit => "store_credit",
            Self::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: Uuid,
    pub tenant_id: String,
    pub return_number: String,
    pub order_id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    pub status: ReturnStatus,
    pub refund_method: RefundMethod,
    #[serde(default)]
    pub refund_amount: Option<Money>,
    #[serde(default)]
    pub refunded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// One returned line, pointing at the order item it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub id: Uuid,
    pub tenant_id: String,
    pub return_id: Uuid,
    pub order_item_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub tenant_id: String,
    pub order_id: Uuid,
    /// `None` for custom or deleted products.
    #[serde(default)]
    pub product_id: Option<Uuid>,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    #[serde(default = "default_track_quantity")]
    pub track_quantity: bool,
    pub quantity: i64,
}

fn default_track_quantity() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCredit {
    pub id: Uuid,
    pub tenant_id: String,
    pub customer_id: Uuid,
    pub initial_balance: Money,
    pub balance: Money,
    #[serde(default)]
    pub source_return_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionKind {
    Credit,
    Debit,
}

impl fmt::Display for CreditTransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
        }
    }
}

/// A ledger entry against a store credit balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCreditTransaction {
    pub id: Uuid,
    pub tenant_id: String,
    pub store_credit_id: Uuid,
    pub kind: CreditTransactionKind,
    pub amount: Money,
    pub balance_after: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// An event published on the event bus, always tagged with its tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: String,
    pub tenant_id: String,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_status_display_matches_serialized_form() -> Result<(), serde_json::Error> {
        for status in [
            ReturnStatus::Requested,
            ReturnStatus::Approved,
            ReturnStatus::Rejected,
            ReturnStatus::Received,
            ReturnStatus::Refunded,
            ReturnStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status)?;
            assert_eq!(json, format!("\"{status}\""));
        }
        Ok(())
    }

    #[test]
    fn refund_method_uses_snake_case() -> Result<(), serde_json::Error> {
        let method: RefundMethod = serde_json::from_str("\"store_credit\"")?;
        assert_eq!(method, RefundMethod::StoreCredit);
        assert_eq!(RefundMethod::OriginalPayment.to_string(), "original_payment");
        Ok(())
    }

    #[test]
    fn refund_method_parses_from_cli_value() {
        let method = RefundMethod::from_str("store-credit", true);
        assert_eq!(method, Ok(RefundMethod::StoreCredit));
    }

    #[test]
    fn product_tracks_quantity_unless_told_otherwise() -> Result<(), serde_json::Error> {
        let product: Product = serde_json::from_str(
            r#"{
                "id": "6f1c1e4e-7a57-4d1e-9a5e-1d8f3c2b0a11",
                "tenant_id": "tenant-a",
                "name": "Mug",
                "quantity": 5
            }"#,
        )?;
        assert!(product.track_quantity);
        assert_eq!(product.quantity, 5);
        Ok(())
    }

    #[test]
    fn return_request_optional_fields_default_to_none() -> Result<(), serde_json::Error> {
        let request: ReturnRequest = serde_json::from_str(
            r#"{
                "id": "0b6f0d8e-3f0e-4a36-b2a4-5c7d0c6f9e01",
                "tenant_id": "tenant-a",
                "return_number": "RET-1001",
                "order_id": "9a1f5c3e-2b7d-4e8f-8c6a-0d4b2e1f7a90",
                "status": "received",
                "refund_method": "original_payment"
            }"#,
        )?;
        assert_eq!(request.status, ReturnStatus::Received);
        assert!(request.customer_id.is_none());
        assert!(request.refund_amount.is_none());
        assert!(request.refunded_at.is_none());
        Ok(())
    }
}
