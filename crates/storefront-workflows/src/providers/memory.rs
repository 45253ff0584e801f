use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::{
    OrderItem, Product, ReturnItem, ReturnRequest, StoreCredit, StoreCreditTransaction,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::transaction::SnapshotTransaction;
use crate::error::{Result, WorkflowError};
use crate::traits::{
    InventoryRepository, ReturnRepository, ReturnUpdate, StoreCreditRepository,
};

/// Rows used to seed an [`InMemoryCommerceStore`], typically read from a JSON
/// fixture. Every row carries its own `tenant_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub returns: Vec<ReturnRequest>,
    pub return_items: Vec<ReturnItem>,
    pub order_items: Vec<OrderItem>,
    pub products: Vec<Product>,
    pub store_credits: Vec<StoreCredit>,
    pub credit_transactions: Vec<StoreCreditTransaction>,
}

/// All rows belonging to one tenant.
#[derive(Debug, Default)]
struct TenantTables {
    returns: HashMap<Uuid, ReturnRequest>,
    return_items: Vec<ReturnItem>,
    order_items: HashMap<Uuid, OrderItem>,
    products: HashMap<Uuid, Product>,
    store_credits: HashMap<Uuid, StoreCredit>,
    credit_transactions: Vec<StoreCreditTransaction>,
}

impl TenantTables {
    fn row(&self, key: RowKey) -> RowImage {
        match key {
            RowKey::Return(id) => RowImage::Return(id, self.returns.get(&id).cloned()),
            RowKey::Product(id) => RowImage::Product(id, self.products.get(&id).cloned()),
            RowKey::StoreCredit(id) => {
                RowImage::StoreCredit(id, self.store_credits.get(&id).cloned())
            }
            RowKey::CreditLedger(id) => RowImage::CreditLedger(
                id,
                self.credit_transactions
                    .iter()
                    .filter(|tx| tx.store_credit_id == id)
                    .cloned()
                    .collect(),
            ),
        }
    }

    fn put_row(&mut self, image: RowImage) {
        match image {
            RowImage::Return(id, Some(row)) => {
                self.returns.insert(id, row);
            }
            RowImage::Return(id, None) => {
                self.returns.remove(&id);
            }
            RowImage::Product(id, Some(row)) => {
                self.products.insert(id, row);
            }
            RowImage::Product(id, None) => {
                self.products.remove(&id);
            }
            RowImage::StoreCredit(id, Some(row)) => {
                self.store_credits.insert(id, row);
            }
            RowImage::StoreCredit(id, None) => {
                self.store_credits.remove(&id);
            }
            RowImage::CreditLedger(id, rows) => {
                self.credit_transactions
                    .retain(|tx| tx.store_credit_id != id);
                self.credit_transactions.extend(rows);
            }
        }
    }
}

/// One row of a tenant, or the whole ledger of one store credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RowKey {
    Return(Uuid),
    Product(Uuid),
    StoreCredit(Uuid),
    CreditLedger(Uuid),
}

/// Contents of the row behind a [`RowKey`] at one point in time. `None` and
/// an empty ledger mean the row did not exist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RowImage {
    Return(Uuid, Option<ReturnRequest>),
    Product(Uuid, Option<Product>),
    StoreCredit(Uuid, Option<StoreCredit>),
    CreditLedger(Uuid, Vec<StoreCreditTransaction>),
}

impl RowImage {
    pub(crate) fn key(&self) -> RowKey {
        match self {
            Self::Return(id, _) => RowKey::Return(*id),
            Self::Product(id, _) => RowKey::Product(*id),
            Self::StoreCredit(id, _) => RowKey::StoreCredit(*id),
            Self::CreditLedger(id, _) => RowKey::CreditLedger(*id),
        }
    }
}

/// Tenant-partitioned in-memory implementation of the commerce repositories.
///
/// Rows live under their tenant's partition, so a lookup for one tenant can
/// never observe another tenant's rows.
#[derive(Debug, Default)]
pub struct InMemoryCommerceStore {
    tenants: RwLock<HashMap<String, TenantTables>>,
}

impl InMemoryCommerceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_seed(seed: SeedData) -> Self {
        let mut tenants: HashMap<String, TenantTables> = HashMap::new();

        for row in seed.returns {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .returns
                .insert(row.id, row);
        }
        for row in seed.return_items {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .return_items
                .push(row);
        }
        for row in seed.order_items {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .order_items
                .insert(row.id, row);
        }
        for row in seed.products {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .products
                .insert(row.id, row);
        }
        for row in seed.store_credits {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .store_credits
                .insert(row.id, row);
        }
        for row in seed.credit_transactions {
            tenants
                .entry(row.tenant_id.clone())
                .or_default()
                .credit_transactions
                .push(row);
        }

        Self {
            tenants: RwLock::new(tenants),
        }
    }

    /// Open a transaction boundary over the rows of `tenant_id` that are
    /// written through it. See [`SnapshotTransaction`].
    #[must_use]
    pub fn transaction(self: &Arc<Self>, tenant_id: impl Into<String>) -> SnapshotTransaction {
        SnapshotTransaction::new(Arc::clone(self), tenant_id.into())
    }

    /// Store credits held by `customer_id`, oldest first.
    pub async fn store_credits_for_customer(
        &self,
        tenant_id: &str,
        customer_id: Uuid,
    ) -> Vec<StoreCredit> {
        let tenants = self.tenants.read().await;
        let mut credits: Vec<StoreCredit> = tenants
            .get(tenant_id)
            .map(|t| {
                t.store_credits
                    .values()
                    .filter(|c| c.customer_id == customer_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        credits.sort_by_key(|c| c.created_at);
        credits
    }

    pub(crate) async fn read_row(&self, tenant_id: &str, key: RowKey) -> RowImage {
        let tenants = self.tenants.read().await;
        match tenants.get(tenant_id) {
            Some(tables) => tables.row(key),
            None => TenantTables::default().row(key),
        }
    }

    /// Put each `(before, after)` pair's `before` image back, but only where
    /// the row still equals `after`. Returns the keys that were left alone
    /// because another writer changed them.
    pub(crate) async fn restore_rows(
        &self,
        tenant_id: &str,
        rows: Vec<(RowImage, RowImage)>,
    ) -> Vec<RowKey> {
        let mut tenants = self.tenants.write().await;
        let tables = tenants.entry(tenant_id.to_string()).or_default();
        let mut changed = Vec::new();
        for (before, after) in rows {
            let key = before.key();
            if tables.row(key) == after {
                tables.put_row(before);
            } else {
                changed.push(key);
            }
        }
        changed
    }
}

#[async_trait]
impl ReturnRepository for InMemoryCommerceStore {
    async fn find_return(&self, tenant_id: &str, return_id: Uuid) -> Result<Option<ReturnRequest>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|t| t.returns.get(&return_id))
            .cloned())
    }

    async fn list_return_items(&self, tenant_id: &str, return_id: Uuid) -> Result<Vec<ReturnItem>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .map(|t| {
                t.return_items
                    .iter()
                    .filter(|item| item.return_id == return_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_return(
        &self,
        tenant_id: &str,
        return_id: Uuid,
        update: ReturnUpdate,
    ) -> Result<ReturnRequest> {
        let mut tenants = self.tenants.write().await;
        let row = tenants
            .get_mut(tenant_id)
            .and_then(|t| t.returns.get_mut(&return_id))
            .ok_or_else(|| WorkflowError::not_found("return", return_id))?;

        if let Some(expected) = update.expected_status.filter(|&s| s != row.status) {
            return Err(WorkflowError::InvalidState(format!(
                "Return {} is {}, expected {expected}",
                row.return_number, row.status
            )));
        }
        row.status = update.status;
        row.refund_amount = update.refund_amount;
        row.refunded_at = update.refunded_at;
        row.admin_notes = update.admin_notes;
        Ok(row.clone())
    }
}

#[async_trait]
impl InventoryRepository for InMemoryCommerceStore {
    async fn find_order_item(
        &self,
        tenant_id: &str,
        order_item_id: Uuid,
    ) -> Result<Option<OrderItem>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|t| t.order_items.get(&order_item_id))
            .cloned())
    }

    async fn find_product(&self, tenant_id: &str, product_id: Uuid) -> Result<Option<Product>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|t| t.products.get(&product_id))
            .cloned())
    }

    async fn set_product_quantity(
        &self,
        tenant_id: &str,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let product = tenants
            .get_mut(tenant_id)
            .and_then(|t| t.products.get_mut(&product_id))
            .ok_or_else(|| WorkflowError::not_found("product", product_id))?;
        product.quantity = quantity;
        Ok(())
    }
}

#[async_trait]
impl StoreCreditRepository for InMemoryCommerceStore {
    async fn insert_store_credit(&self, credit: StoreCredit) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let tables = tenants.entry(credit.tenant_id.clone()).or_default();
        if tables.store_credits.contains_key(&credit.id) {
            return Err(WorkflowError::Storage(format!(
                "store credit '{}' already exists",
                credit.id
            )));
        }
        tables.store_credits.insert(credit.id, credit);
        Ok(())
    }

    async fn insert_credit_transaction(&self, transaction: StoreCreditTransaction) -> Result<()> {
        let mut tenants = self.tenants.write().await;
        let tables = tenants
            .get_mut(&transaction.tenant_id)
            .filter(|t| t.store_credits.contains_key(&transaction.store_credit_id))
            .ok_or_else(|| WorkflowError::not_found("store credit", transaction.store_credit_id))?;
        tables.credit_transactions.push(transaction);
        Ok(())
    }

    async fn find_store_credit(
        &self,
        tenant_id: &str,
        credit_id: Uuid,
    ) -> Result<Option<StoreCredit>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|t| t.store_credits.get(&credit_id))
            .cloned())
    }

    async fn list_credit_transactions(
        &self,
        tenant_id: &str,
        credit_id: Uuid,
    ) -> Result<Vec<StoreCreditTransaction>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .map(|t| {
                t.credit_transactions
                    .iter()
                    .filter(|tx| tx.store_credit_id == credit_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_credit_transactions(&self, tenant_id: &str, credit_id: Uuid) -> Result<usize> {
        let mut tenants = self.tenants.write().await;
        let Some(tables) = tenants.get_mut(tenant_id) else {
            return Ok(0);
        };
        let before = tables.credit_transactions.len();
        tables
            .credit_transactions
            .retain(|tx| tx.store_credit_id != credit_id);
        Ok(before - tables.credit_transactions.len())
    }

    async fn delete_store_credit(&self, tenant_id: &str, credit_id: Uuid) -> Result<bool> {
        let mut tenants = self.tenants.write().await;
        Ok(tenants
            .get_mut(tenant_id)
            .and_then(|t| t.store_credits.remove(&credit_id))
            .is_some())
    }
}
