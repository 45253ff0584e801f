use std::sync::Arc;

use async_trait::async_trait;
use storefront_core::{
    OrderItem, Product, RefundMethod, ReturnItem, ReturnRequest, ReturnStatus,
};
use uuid::Uuid;

use crate::providers::{InMemoryCommerceStore, SeedData};
use crate::traits::{EventPublisher, InventoryRepository, ReturnRepository, ReturnUpdate};
use crate::{Result, WorkflowError};

/// A single-tenant store with one return of one line on one tracked product.
pub struct Fixture {
    pub return_id: Uuid,
    pub product_id: Uuid,
    pub customer_id: Uuid,
    seed: SeedData,
}

impl Fixture {
    pub const TENANT: &'static str = "tenant-a";

    pub fn single_item(status: ReturnStatus, stock: i64, returned: i64) -> Self {
        let return_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let order_item_id = Uuid::new_v4();

        let seed = SeedData {
            returns: vec![ReturnRequest {
                id: return_id,
                tenant_id: Self::TENANT.to_string(),
                return_number: "RET-1001".to_string(),
                order_id,
                customer_id: Some(customer_id),
                status,
                refund_method: RefundMethod::OriginalPayment,
                refund_amount: None,
                refunded_at: None,
                admin_notes: None,
            }],
            return_items: vec![ReturnItem {
                id: Uuid::new_v4(),
                tenant_id: Self::TENANT.to_string(),
                return_id,
                order_item_id,
                quantity: returned,
            }],
            order_items: vec![OrderItem {
                id: order_item_id,
                tenant_id: Self::TENANT.to_string(),
                order_id,
                product_id: Some(product_id),
                quantity: returned,
            }],
            products: vec![Product {
                id: product_id,
                tenant_id: Self::TENANT.to_string(),
                name: "Ceramic mug".to_string(),
                track_quantity: true,
                quantity: stock,
            }],
            ..SeedData::default()
        };

        Self {
            return_id,
            product_id,
            customer_id,
            seed,
        }
    }

    pub fn store(&self) -> InMemoryCommerceStore {
        InMemoryCommerceStore::from_seed(self.seed.clone())
    }

    pub async fn product_quantity(&self, store: &InMemoryCommerceStore) -> Result<i64> {
        store
            .find_product(Self::TENANT, self.product_id)
            .await?
            .map(|p| p.quantity)
            .ok_or_else(|| WorkflowError::not_found("product", self.product_id))
    }

    pub async fn return_status(&self, store: &InMemoryCommerceStore) -> Result<ReturnStatus> {
        store
            .find_return(Self::TENANT, self.return_id)
            .await?
            .map(|r| r.status)
            .ok_or_else(|| WorkflowError::not_found("return", self.return_id))
    }
}

/// Reads through to the store but refuses every write.
pub struct FailingReturnRepository {
    inner: Arc<InMemoryCommerceStore>,
}

impl FailingReturnRepository {
    pub fn new(inner: Arc<InMemoryCommerceStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ReturnRepository for FailingReturnRepository {
    async fn find_return(&self, tenant_id: &str, return_id: Uuid) -> Result<Option<ReturnRequest>> {
        self.inner.find_return(tenant_id, return_id).await
    }

    async fn list_return_items(&self, tenant_id: &str, return_id: Uuid) -> Result<Vec<ReturnItem>> {
        self.inner.list_return_items(tenant_id, return_id).await
    }

    async fn update_return(
        &self,
        _tenant_id: &str,
        _return_id: Uuid,
        _update: ReturnUpdate,
    ) -> Result<ReturnRequest> {
        Err(WorkflowError::Storage("simulated write failure".to_string()))
    }
}

/// Hands control back to the scheduler after every return lookup, so two
/// refunds of the same return both read it before either writes.
pub struct YieldingReturnRepository {
    inner: Arc<InMemoryCommerceStore>,
}

impl YieldingReturnRepository {
    pub fn new(inner: Arc<InMemoryCommerceStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ReturnRepository for YieldingReturnRepository {
    async fn find_return(&self, tenant_id: &str, return_id: Uuid) -> Result<Option<ReturnRequest>> {
        let found = self.inner.find_return(tenant_id, return_id).await;
        tokio::task::yield_now().await;
        found
    }

    async fn list_return_items(&self, tenant_id: &str, return_id: Uuid) -> Result<Vec<ReturnItem>> {
        self.inner.list_return_items(tenant_id, return_id).await
    }

    async fn update_return(
        &self,
        tenant_id: &str,
        return_id: Uuid,
        update: ReturnUpdate,
    ) -> Result<ReturnRequest> {
        self.inner.update_return(tenant_id, return_id, update).await
    }
}

pub struct FailingEventPublisher;

#[async_trait]
impl EventPublisher for FailingEventPublisher {
    async fn publish(
        &self,
        event_name: &str,
        _tenant_id: &str,
        _payload: serde_json::Value,
    ) -> Result<()> {
        Err(WorkflowError::EventBus {
            event: event_name.to_string(),
            reason: "bus unavailable".to_string(),
        })
    }
}
