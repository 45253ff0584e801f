use async_trait::async_trait;
use storefront_core::{OrderItem, Product};
use uuid::Uuid;

use crate::Result;

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find_order_item(&self, tenant_id: &str, order_item_id: Uuid)
    -> Result<Option<OrderItem>>;

    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find_product(&self, tenant_id: &str, product_id: Uuid) -> Result<Option<Product>>;

    /// # Errors
    ///
    /// Returns `WorkflowError::NotFound` if the tenant has no such product.
    async fn set_product_quantity(
        &self,
        tenant_id: &str,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<()>;
}
