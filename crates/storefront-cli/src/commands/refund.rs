use std::sync::Arc;

use clap::Args;
use storefront_core::{Money, RefundMethod};
use storefront_workflows::operations::{RefundInput, RefundOperation};
use storefront_workflows::providers::{BroadcastEventPublisher, InMemoryCommerceStore};
use storefront_workflows::traits::{InventoryRepository, ReturnRepository};
use storefront_workflows::{ActionResult, RefundConfig};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;

#[derive(Args)]
pub(crate) struct RefundArgs {
    /// Tenant that owns the return
    #[arg(long)]
    tenant: String,

    /// Return request to refund
    #[arg(long, value_name = "UUID")]
    return_id: Uuid,

    /// Amount to refund, e.g. 12.50
    #[arg(long, value_name = "AMOUNT")]
    amount: Money,

    /// Refund method (default: the method recorded on the return)
    #[arg(long, value_enum)]
    method: Option<RefundMethod>,

    /// Leave product stock untouched
    #[arg(long)]
    no_restore_inventory: bool,

    /// Admin notes stored on the return
    #[arg(long)]
    notes: Option<String>,

    /// Write through a transaction that rolls back this refund's rows on failure
    #[arg(long)]
    transactional: bool,
}

impl RefundArgs {
    fn input(&self) -> RefundInput {
        let mut input = RefundInput::new(self.return_id, self.amount);
        if let Some(method) = self.method {
            input = input.with_refund_method(method);
        }
        if self.no_restore_inventory {
            input = input.with_restore_inventory(false);
        }
        if let Some(notes) = &self.notes {
            input = input.with_admin_notes(notes.clone());
        }
        input
    }
}

pub(crate) async fn run(
    args: RefundArgs,
    store: Arc<InMemoryCommerceStore>,
    config: RefundConfig,
) -> Result<bool> {
    let events = Arc::new(BroadcastEventPublisher::default());
    let mut published = events.subscribe();

    let input = args.input();
    let result = if args.transactional {
        let transaction = Arc::new(store.transaction(args.tenant.as_str()));
        let operation = RefundOperation::new(
            Arc::clone(&transaction),
            Arc::clone(&transaction),
            Arc::clone(&transaction),
            Arc::clone(&events),
            config,
        );
        operation
            .execute_in_transaction(&args.tenant, input, transaction.as_ref())
            .await
    } else {
        let operation = RefundOperation::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&events),
            config,
        );
        let (result, audit_log) = operation.execute_with_audit(&args.tenant, input).await;
        debug!(state = ?audit_log.state(), steps = %audit_log.summary(), "saga audit");
        result
    };

    while let Ok(event) = published.try_recv() {
        info!(
            event = %event.name,
            tenant_id = %event.tenant_id,
            payload = %event.payload,
            "published"
        );
    }
    log_state(&store, &args.tenant, args.return_id).await?;

    let success = result.is_ok();
    let output = ActionResult::from(result);
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(success)
}

async fn log_state(store: &InMemoryCommerceStore, tenant_id: &str, return_id: Uuid) -> Result<()> {
    let Some(request) = store.find_return(tenant_id, return_id).await? else {
        return Ok(());
    };
    info!(
        return_number = %request.return_number,
        status = %request.status,
        "return state"
    );

    for item in store.list_return_items(tenant_id, return_id).await? {
        let Some(product_id) = store
            .find_order_item(tenant_id, item.order_item_id)
            .await?
            .and_then(|order_item| order_item.product_id)
        else {
            continue;
        };
        if let Some(product) = store.find_product(tenant_id, product_id).await? {
            info!(
                product = %product.name,
                %product_id,
                quantity = product.quantity,
                "product state"
            );
        }
    }

    if let Some(customer_id) = request.customer_id {
        for credit in store.store_credits_for_customer(tenant_id, customer_id).await {
            info!(
                store_credit_id = %credit.id,
                balance = %credit.balance,
                "store credit state"
            );
        }
    }
    Ok(())
}
