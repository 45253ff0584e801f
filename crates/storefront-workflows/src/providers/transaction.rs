use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use storefront_core::{
    OrderItem, Product, ReturnItem, ReturnRequest, StoreCredit, StoreCreditTransaction,
};
use storefront_saga::TransactionBoundary;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::memory::{InMemoryCommerceStore, RowImage, RowKey};
use crate::error::{Result, WorkflowError};
use crate::traits::{
    InventoryRepository, ReturnRepository, ReturnUpdate, StoreCreditRepository,
};

/// Before and latest image of every row written since `begin`, in first-write
/// order.
#[derive(Debug, Default)]
struct Journal {
    order: Vec<RowKey>,
    rows: HashMap<RowKey, (RowImage, RowImage)>,
}

impl Journal {
    fn record(&mut self, before: RowImage, after: RowImage) {
        let key = before.key();
        if let Some(entry) = self.rows.get_mut(&key) {
            entry.1 = after;
        } else {
            self.order.push(key);
            self.rows.insert(key, (before, after));
        }
    }

    fn into_undo(mut self) -> Vec<(RowImage, RowImage)> {
        self.order
            .iter()
            .rev()
            .filter_map(|key| self.rows.remove(key))
            .collect()
    }
}

/// Transaction boundary over one tenant of an [`InMemoryCommerceStore`].
///
/// The transaction is itself a repository: writes made through it while it
/// is open are passed on to the store and journaled with the row's image
/// from before the first write. `rollback` puts back only those rows, and
/// only where the row still holds what this transaction last wrote. A row
/// that another writer changed in between is left alone and reported as a
/// rollback error. Writes made directly on the store are never touched.
///
/// Reads are not isolated: they see every committed write immediately.
pub struct SnapshotTransaction {
    store: Arc<InMemoryCommerceStore>,
    tenant_id: String,
    journal: Mutex<Option<Journal>>,
}

impl SnapshotTransaction {
    pub(crate) fn new(store: Arc<InMemoryCommerceStore>, tenant_id: String) -> Self {
        Self {
            store,
            tenant_id,
            journal: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Run `write` against the store, journaling `key` if a transaction is
    /// open. The journal stays locked for the whole write.
    async fn write_through<T, F>(&self, tenant_id: &str, key: RowKey, write: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
        T: Send,
    {
        if tenant_id != self.tenant_id {
            return Err(WorkflowError::Storage(format!(
                "transaction for tenant '{}' cannot write rows of tenant '{tenant_id}'",
                self.tenant_id
            )));
        }

        let mut journal = self.journal.lock().await;
        let Some(open) = journal.as_mut() else {
            return write.await;
        };
        let before = self.store.read_row(tenant_id, key).await;
        let result = write.await;
        let after = self.store.read_row(tenant_id, key).await;
        open.record(before, after);
        result
    }
}

#[async_trait]
impl TransactionBoundary for SnapshotTransaction {
    type Error = WorkflowError;

    async fn begin(&self) -> Result<()> {
        let mut journal = self.journal.lock().await;
        if journal.is_some() {
            return Err(WorkflowError::Storage(format!(
                "transaction for tenant '{}' already open",
                self.tenant_id
            )));
        }
        *journal = Some(Journal::default());
        debug!(tenant_id = %self.tenant_id, "transaction opened");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut journal = self.journal.lock().await;
        let Some(committed) = journal.take() else {
            return Err(WorkflowError::Storage(
                "commit without an open transaction".to_string(),
            ));
        };
        debug!(
            tenant_id = %self.tenant_id,
            rows = committed.order.len(),
            "transaction committed"
        );
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut journal = self.journal.lock().await;
        let open = journal.take().ok_or_else(|| {
            WorkflowError::Storage("rollback without an open transaction".to_string())
        })?;

        let changed = self
            .store
            .restore_rows(&self.tenant_id, open.into_undo())
            .await;
        if changed.is_empty() {
            debug!(tenant_id = %self.tenant_id, "transaction rolled back");
            return Ok(());
        }

        for key in &changed {
            warn!(
                tenant_id = %self.tenant_id,
                row = ?key,
                "row changed by another writer, not rolled back"
            );
        }
        Err(WorkflowError::Storage(format!(
            "rollback left {} row(s) of tenant '{}' that another writer changed",
            changed.len(),
            self.tenant_id
        )))
    }
}

#[async_trait]
impl ReturnRepository for SnapshotTransaction {
    async fn find_return(&self, tenant_id: &str, return_id: Uuid) -> Result<Option<ReturnRequest>> {
        self.store.find_return(tenant_id, return_id).await
    }

    async fn list_return_items(&self, tenant_id: &str, return_id: Uuid) -> Result<Vec<ReturnItem>> {
        self.store.list_return_items(tenant_id, return_id).await
    }

    async fn update_return(
        &self,
        tenant_id: &str,
        return_id: Uuid,
        update: ReturnUpdate,
    ) -> Result<ReturnRequest> {
        self.write_through(
            tenant_id,
            RowKey::Return(return_id),
            self.store.update_return(tenant_id, return_id, update),
        )
        .await
    }
}

#[async_trait]
impl InventoryRepository for SnapshotTransaction {
    async fn find_order_item(
        &self,
        tenant_id: &str,
        order_item_id: Uuid,
    ) -> Result<Option<OrderItem>> {
        self.store.find_order_item(tenant_id, order_item_id).await
    }

    async fn find_product(&self, tenant_id: &str, product_id: Uuid) -> Result<Option<Product>> {
        self.store.find_product(tenant_id, product_id).await
    }

    async fn set_product_quantity(
        &self,
        tenant_id: &str,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<()> {
        self.write_through(
            tenant_id,
            RowKey::Product(product_id),
            self.store.set_product_quantity(tenant_id, product_id, quantity),
        )
        .await
    }
}

#[async_trait]
impl StoreCreditRepository for SnapshotTransaction {
    async fn insert_store_credit(&self, credit: StoreCredit) -> Result<()> {
        let tenant_id = credit.tenant_id.clone();
        let key = RowKey::StoreCredit(credit.id);
        self.write_through(&tenant_id, key, self.store.insert_store_credit(credit))
            .await
    }

    async fn insert_credit_transaction(&self, transaction: StoreCreditTransaction) -> Result<()> {
        let tenant_id = transaction.tenant_id.clone();
        let key = RowKey::CreditLedger(transaction.store_credit_id);
        self.write_through(&tenant_id, key, self.store.insert_credit_transaction(transaction))
            .await
    }

    async fn find_store_credit(
        &self,
        tenant_id: &str,
        credit_id: Uuid,
    ) -> Result<Option<StoreCredit>> {
        self.store.find_store_credit(tenant_id, credit_id).await
    }

    async fn list_credit_transactions(
        &self,
        tenant_id: &str,
        credit_id: Uuid,
    ) -> Result<Vec<StoreCreditTransaction>> {
        self.store.list_credit_transactions(tenant_id, credit_id).await
    }

    async fn delete_credit_transactions(&self, tenant_id: &str, credit_id: Uuid) -> Result<usize> {
        self.write_through(
            tenant_id,
            RowKey::CreditLedger(credit_id),
            self.store.delete_credit_transactions(tenant_id, credit_id),
        )
        .await
    }

    async fn delete_store_credit(&self, tenant_id: &str, credit_id: Uuid) -> Result<bool> {
        self.write_through(
            tenant_id,
            RowKey::StoreCredit(credit_id),
            self.store.delete_store_credit(tenant_id, credit_id),
        )
        .await
    }
}
