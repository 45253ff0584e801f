use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use storefront_core::{
    CreditTransactionKind, RefundMethod, ReturnItem, ReturnStatus, StoreCredit,
    StoreCreditTransaction,
};
use storefront_saga::{Compensable, CompensableStep, SagaStep, WorkflowContext};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::context::RefundServices;
use super::saga_data::{
    InventoryRestoration, PreviousReturnState, RefundInput, RefundOutcome, RefundSagaData,
};
use crate::WorkflowError;
use crate::traits::{
    EventPublisher, InventoryRepository, ReturnRepository, ReturnUpdate, StoreCreditRepository,
};

type Ctx<R, I, C, P> = WorkflowContext<RefundServices<R, I, C, P>>;

pub struct ValidateRefundStep<R, I, C, P> {
    _marker: PhantomData<(R, I, C, P)>,
}

impl<R, I, C, P> ValidateRefundStep<R, I, C, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, I, C, P> Default for ValidateRefundStep<R, I, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, I, C, P> SagaStep for ValidateRefundStep<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    type Input = RefundInput;
    type Output = RefundSagaData;
    type Handle = RefundServices<R, I, C, P>;
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "validate_refund"
    }

    async fn execute(
        &self,
        ctx: &Ctx<R, I, C, P>,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let services = ctx.handle();
        let tenant_id = ctx.tenant_id();

        let request = services
            .returns()
            .find_return(tenant_id, input.return_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("return", input.return_id))?;

        let config = services.config();
        if !config.is_refundable(request.status) {
            return Err(WorkflowError::InvalidState(format!(
                "Cannot process refund for return with status \"{}\". Return must be {}",
                request.status,
                config.refundable_statuses_display()
            )));
        }

        if !input.refund_amount.is_positive() {
            return Err(WorkflowError::Validation(format!(
                "refund amount must be greater than zero, got {}",
                input.refund_amount
            )));
        }

        let items = services
            .returns()
            .list_return_items(tenant_id, request.id)
            .await?;

        debug!(
            tenant_id,
            return_number = %request.return_number,
            items = items.len(),
            "refund validated"
        );

        Ok(RefundSagaData {
            refund_method: input.refund_method.unwrap_or(request.refund_method),
            restore_inventory: input
                .restore_inventory
                .unwrap_or(config.restore_inventory_by_default),
            refund_amount: input.refund_amount,
            admin_notes: input.admin_notes,
            return_request: request,
            items,
            restored_inventory: Vec::new(),
            store_credit_id: None,
            updated_return: None,
        })
    }
}

pub struct RestoreInventoryStep<R, I, C, P> {
    _marker: PhantomData<(R, I, C, P)>,
}

impl<R, I, C, P> RestoreInventoryStep<R, I, C, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, I, C, P> Default for RestoreInventoryStep<R, I, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Add a returned line's quantity back to its product's stock.
///
/// Returns `None` when the line has no product, the product is gone, or the
/// product does not track stock.
async fn restore_item<I: InventoryRepository>(
    inventory: &I,
    tenant_id: &str,
    item: &ReturnItem,
) -> Result<Option<InventoryRestoration>, WorkflowError> {
    if item.quantity <= 0 {
        return Err(WorkflowError::Validation(format!(
            "return item '{}' has non-positive quantity {}",
            item.id, item.quantity
        )));
    }
    let order_item = inventory
        .find_order_item(tenant_id, item.order_item_id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("order item", item.order_item_id))?;

    let Some(product_id) = order_item.product_id else {
        debug!(tenant_id, order_item = %order_item.id, "order item has no product, skipping");
        return Ok(None);
    };
    let Some(product) = inventory.find_product(tenant_id, product_id).await? else {
        debug!(tenant_id, %product_id, "product no longer exists, skipping");
        return Ok(None);
    };
    if !product.track_quantity {
        return Ok(None);
    }

    let quantity = product.quantity.checked_add(item.quantity).ok_or_else(|| {
        WorkflowError::Validation(format!("stock for product '{product_id}' would overflow"))
    })?;
    inventory
        .set_product_quantity(tenant_id, product_id, quantity)
        .await?;

    debug!(
        tenant_id,
        %product_id,
        previous = product.quantity,
        new = quantity,
        "restored stock"
    );
    Ok(Some(InventoryRestoration {
        product_id,
        quantity: item.quantity,
        previous_quantity: product.quantity,
    }))
}

/// Write previous quantities back, newest first. Keeps going on failure and
/// returns the first error.
async fn revert_restorations<I: InventoryRepository>(
    inventory: &I,
    tenant_id: &str,
    restorations: &[InventoryRestoration],
) -> Result<(), WorkflowError> {
    let mut first_error = None;
    for restoration in restorations.iter().rev() {
        if let Err(err) = inventory
            .set_product_quantity(
                tenant_id,
                restoration.product_id,
                restoration.previous_quantity,
            )
            .await
        {
            warn!(
                tenant_id,
                product_id = %restoration.product_id,
                error = %err,
                "failed to revert stock"
            );
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

#[async_trait]
impl<R, I, C, P> CompensableStep for RestoreInventoryStep<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    type Input = RefundSagaData;
    type Output = RefundSagaData;
    type Compensation = Vec<InventoryRestoration>;
    type Handle = RefundServices<R, I, C, P>;
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "restore_inventory"
    }

    async fn execute(
        &self,
        ctx: &Ctx<R, I, C, P>,
        mut input: Self::Input,
    ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error> {
        let tenant_id = ctx.tenant_id();
        if !input.restore_inventory || input.items.is_empty() {
            debug!(tenant_id, "nothing to restock");
            return Ok(Compensable::new(input, Vec::new()));
        }

        let inventory = ctx.handle().inventory();
        let mut applied = Vec::new();
        for item in &input.items {
            match restore_item(inventory, tenant_id, item).await {
                Ok(Some(restoration)) => applied.push(restoration),
                Ok(None) => {}
                Err(err) => {
                    if let Err(revert_err) =
                        revert_restorations(inventory, tenant_id, &applied).await
                    {
                        error!(
                            tenant_id,
                            restocked = applied.len(),
                            error = %revert_err,
                            "partial restock could not be reverted"
                        );
                    }
                    return Err(err);
                }
            }
        }

        input.restored_inventory.clone_from(&applied);
        Ok(Compensable::new(input, applied))
    }

    async fn compensate(
        &self,
        ctx: &Ctx<R, I, C, P>,
        restorations: Self::Compensation,
    ) -> Result<(), Self::Error> {
        debug!(
            tenant_id = ctx.tenant_id(),
            count = restorations.len(),
            "reverting restored stock"
        );
        revert_restorations(ctx.handle().inventory(), ctx.tenant_id(), &restorations).await
    }

    fn compensation_description(&self) -> String {
        "write previous stock levels back to restocked products".to_string()
    }
}

pub struct CreateStoreCreditStep<R, I, C, P> {
    _marker: PhantomData<(R, I, C, P)>,
}

impl<R, I, C, P> CreateStoreCreditStep<R, I, C, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, I, C, P> Default for CreateStoreCreditStep<R, I, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, I, C, P> CompensableStep for CreateStoreCreditStep<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    type Input = RefundSagaData;
    type Output = RefundSagaData;
    type Compensation = Option<Uuid>;
    type Handle = RefundServices<R, I, C, P>;
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "create_store_credit"
    }

    async fn execute(
        &self,
        ctx: &Ctx<R, I, C, P>,
        mut input: Self::Input,
    ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error> {
        let tenant_id = ctx.tenant_id();
        let customer_id = match (input.refund_method, input.return_request.customer_id) {
            (RefundMethod::StoreCredit, Some(customer_id)) => customer_id,
            (RefundMethod::StoreCredit, None) => {
                debug!(tenant_id, "return has no customer, no store credit issued");
                return Ok(Compensable::new(input, None));
            }
            _ => return Ok(Compensable::new(input, None)),
        };

        let credits = ctx.handle().credits();
        let now = Utc::now();
        let credit = StoreCredit {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            customer_id,
            initial_balance: input.refund_amount,
            balance: input.refund_amount,
            source_return_id: Some(input.return_request.id),
            created_at: now,
        };
        let credit_id = credit.id;
        credits.insert_store_credit(credit).await?;

        let transaction = StoreCreditTransaction {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            store_credit_id: credit_id,
            kind: CreditTransactionKind::Credit,
            amount: input.refund_amount,
            balance_after: input.refund_amount,
            description: format!("Refund for return {}", input.return_request.return_number),
            created_at: now,
        };
        if let Err(err) = credits.insert_credit_transaction(transaction).await {
            if let Err(cleanup) = credits.delete_store_credit(tenant_id, credit_id).await {
                warn!(
                    tenant_id,
                    %credit_id,
                    error = %cleanup,
                    "failed to remove orphaned store credit"
                );
            }
            return Err(err);
        }

        debug!(tenant_id, %credit_id, amount = %input.refund_amount, "issued store credit");
        input.store_credit_id = Some(credit_id);
        Ok(Compensable::new(input, Some(credit_id)))
    }

    async fn compensate(
        &self,
        ctx: &Ctx<R, I, C, P>,
        credit_id: Self::Compensation,
    ) -> Result<(), Self::Error> {
        let Some(credit_id) = credit_id else {
            return Ok(());
        };
        let tenant_id = ctx.tenant_id();
        let credits = ctx.handle().credits();

        let transactions = credits.list_credit_transactions(tenant_id, credit_id).await?;
        if transactions
            .iter()
            .any(|tx| tx.kind == CreditTransactionKind::Debit)
        {
            return Err(WorkflowError::Compensation {
                step: "create_store_credit",
                reason: format!("store credit '{credit_id}' has already been spent"),
            });
        }

        let removed = credits.delete_credit_transactions(tenant_id, credit_id).await?;
        let deleted = credits.delete_store_credit(tenant_id, credit_id).await?;
        debug!(
            tenant_id,
            %credit_id,
            transactions = removed,
            deleted,
            "removed store credit"
        );
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete issued store credit and its ledger transactions".to_string()
    }
}

pub struct UpdateReturnStatusStep<R, I, C, P> {
    _marker: PhantomData<(R, I, C, P)>,
}

impl<R, I, C, P> UpdateReturnStatusStep<R, I, C, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, I, C, P> Default for UpdateReturnStatusStep<R, I, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, I, C, P> CompensableStep for UpdateReturnStatusStep<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    type Input = RefundSagaData;
    type Output = RefundSagaData;
    type Compensation = PreviousReturnState;
    type Handle = RefundServices<R, I, C, P>;
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "update_return_status"
    }

    async fn execute(
        &self,
        ctx: &Ctx<R, I, C, P>,
        mut input: Self::Input,
    ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error> {
        let previous = PreviousReturnState::of(&input.return_request);
        let update = ReturnUpdate {
            expected_status: Some(previous.status),
            status: ReturnStatus::Refunded,
            refund_amount: Some(input.refund_amount),
            refunded_at: Some(Utc::now()),
            admin_notes: input
                .admin_notes
                .clone()
                .or_else(|| input.return_request.admin_notes.clone()),
        };

        let updated = ctx
            .handle()
            .returns()
            .update_return(ctx.tenant_id(), input.return_request.id, update)
            .await?;

        debug!(
            tenant_id = ctx.tenant_id(),
            return_number = %updated.return_number,
            from = %previous.status,
            to = %updated.status,
            "return status updated"
        );
        input.updated_return = Some(updated);
        Ok(Compensable::new(input, previous))
    }

    async fn compensate(
        &self,
        ctx: &Ctx<R, I, C, P>,
        previous: Self::Compensation,
    ) -> Result<(), Self::Error> {
        let update = ReturnUpdate {
            expected_status: Some(ReturnStatus::Refunded),
            status: previous.status,
            refund_amount: previous.refund_amount,
            refunded_at: previous.refunded_at,
            admin_notes: previous.admin_notes,
        };
        match ctx
            .handle()
            .returns()
            .update_return(ctx.tenant_id(), previous.return_id, update)
            .await
        {
            Ok(_) => Ok(()),
            Err(WorkflowError::NotFound { .. }) => {
                debug!(
                    tenant_id = ctx.tenant_id(),
                    return_id = %previous.return_id,
                    "return gone, nothing to restore"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn compensation_description(&self) -> String {
        "restore previous return status and clear refund fields".to_string()
    }
}

pub struct EmitRefundProcessedStep<R, I, C, P> {
    _marker: PhantomData<(R, I, C, P)>,
}

impl<R, I, C, P> EmitRefundProcessedStep<R, I, C, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, I, C, P> Default for EmitRefundProcessedStep<R, I, C, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, I, C, P> SagaStep for EmitRefundProcessedStep<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    type Input = RefundSagaData;
    type Output = RefundOutcome;
    type Handle = RefundServices<R, I, C, P>;
    type Error = WorkflowError;

    fn name(&self) -> &'static str {
        "emit_refund_processed"
    }

    async fn execute(
        &self,
        ctx: &Ctx<R, I, C, P>,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let services = ctx.handle();
        let tenant_id = ctx.tenant_id();
        let event_name = &services.config().event_name;

        let payload = serde_json::json!({
            "tenantId": tenant_id,
            "returnId": input.return_request.id,
            "returnNumber": input.return_request.return_number,
            "refundAmount": input.refund_amount,
            "refundMethod": input.refund_method,
        });
        services
            .events()
            .publish(event_name, tenant_id, payload)
            .await?;

        debug!(tenant_id, event = %event_name, "refund event published");
        Ok(RefundOutcome::from(input))
    }
}
