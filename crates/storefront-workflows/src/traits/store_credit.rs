use async_trait::async_trait;
use storefront_core::{StoreCredit, StoreCreditTransaction};
use uuid::Uuid;

use crate::Result;

#[async_trait]
pub trait StoreCreditRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn insert_store_credit(&self, credit: StoreCredit) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn insert_credit_transaction(&self, transaction: StoreCreditTransaction) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn find_store_credit(&self, tenant_id: &str, credit_id: Uuid)
    -> Result<Option<StoreCredit>>;

    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn list_credit_transactions(
        &self,
        tenant_id: &str,
        credit_id: Uuid,
    ) -> Result<Vec<StoreCreditTransaction>>;

    /// Returns the number of deleted transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be deleted.
    async fn delete_credit_transactions(&self, tenant_id: &str, credit_id: Uuid) -> Result<usize>;

    /// Returns whether a record was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be deleted.
    async fn delete_store_credit(&self, tenant_id: &str, credit_id: Uuid) -> Result<bool>;
}
