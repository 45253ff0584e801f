use std::sync::Arc;

use storefront_saga::{
    CancellationToken, Saga, SagaAuditLog, SagaBuilder, TransactionBoundary, WorkflowContext,
};
use tracing::{info, warn};

use super::context::RefundServices;
use super::saga_data::{RefundInput, RefundOutcome};
use super::saga_steps::{
    CreateStoreCreditStep, EmitRefundProcessedStep, RestoreInventoryStep, UpdateReturnStatusStep,
    ValidateRefundStep,
};
use crate::config::RefundConfig;
use crate::error::{Result, WorkflowError};
use crate::traits::{EventPublisher, InventoryRepository, ReturnRepository, StoreCreditRepository};

type RefundSaga<R, I, C, P> =
    Saga<RefundInput, RefundOutcome, RefundServices<R, I, C, P>, WorkflowError>;

/// Processes a refund for a received or approved return.
///
/// Each call validates the return, restocks returned items, issues store
/// credit when requested, marks the return refunded and publishes the refund
/// event. Any failure undoes the completed steps before the error is
/// returned.
pub struct RefundOperation<R, I, C, P> {
    services: RefundServices<R, I, C, P>,
}

impl<R, I, C, P> RefundOperation<R, I, C, P>
where
    R: ReturnRepository + 'static,
    I: InventoryRepository + 'static,
    C: StoreCreditRepository + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(
        returns: Arc<R>,
        inventory: Arc<I>,
        credits: Arc<C>,
        events: Arc<P>,
        config: RefundConfig,
    ) -> Self {
        Self {
            services: RefundServices::new(returns, inventory, credits, events, Arc::new(config)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RefundConfig {
        self.services.config()
    }

    /// # Errors
    ///
    /// Returns the error of the step that failed, wrapped in
    /// `WorkflowError::SagaFailed` or `WorkflowError::SagaCompensationFailed`.
    pub async fn execute(&self, tenant_id: &str, input: RefundInput) -> Result<RefundOutcome> {
        let (result, _audit_log) = self.execute_with_audit(tenant_id, input).await;
        result
    }

    /// Run the refund and return the saga audit log alongside the result.
    pub async fn execute_with_audit(
        &self,
        tenant_id: &str,
        input: RefundInput,
    ) -> (Result<RefundOutcome>, SagaAuditLog) {
        let return_id = input.return_id;
        info!(tenant_id, %return_id, amount = %input.refund_amount, "processing refund");

        let mut ctx = self.context(tenant_id);
        let (result, audit_log) = Self::saga().execute_with_audit(&mut ctx, input).await;
        (Self::finish(tenant_id, result.map_err(Into::into)), audit_log)
    }

    /// Run the refund, stopping before the next step once `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::SagaCancelled` if cancellation was observed, or
    /// any error [`execute`](Self::execute) returns.
    pub async fn execute_cancellable(
        &self,
        tenant_id: &str,
        input: RefundInput,
        token: &CancellationToken,
    ) -> Result<RefundOutcome> {
        info!(tenant_id, return_id = %input.return_id, "processing refund");

        let mut ctx = self.context(tenant_id);
        let result = Self::saga().execute_cancellable(&mut ctx, input, token).await;
        Self::finish(tenant_id, result.map_err(Into::into))
    }

    /// Run the refund inside `transaction`.
    ///
    /// Compensations cover the effects made before the failure; the
    /// transaction rollback then covers whatever the store itself can undo.
    /// Only writes that go through the transaction are covered, so for a
    /// [`SnapshotTransaction`](crate::providers::SnapshotTransaction) the
    /// operation's repositories should be that transaction.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::TransactionFailed` if the transaction cannot
    /// begin or commit, or any error [`execute`](Self::execute) returns.
    pub async fn execute_in_transaction<T>(
        &self,
        tenant_id: &str,
        input: RefundInput,
        transaction: &T,
    ) -> Result<RefundOutcome>
    where
        T: TransactionBoundary<Error = WorkflowError>,
    {
        info!(tenant_id, return_id = %input.return_id, "processing refund in transaction");

        let mut ctx = self.context(tenant_id);
        let result = Self::saga()
            .execute_in_transaction(&mut ctx, input, transaction)
            .await;
        Self::finish(tenant_id, result.map_err(Into::into))
    }

    fn context(&self, tenant_id: &str) -> WorkflowContext<RefundServices<R, I, C, P>> {
        WorkflowContext::new(tenant_id, self.services.clone())
    }

    fn saga() -> RefundSaga<R, I, C, P> {
        SagaBuilder::new()
            .first_step(ValidateRefundStep::<R, I, C, P>::new())
            .then_compensable(RestoreInventoryStep::<R, I, C, P>::new())
            .then_compensable(CreateStoreCreditStep::<R, I, C, P>::new())
            .then_compensable(UpdateReturnStatusStep::<R, I, C, P>::new())
            .then(EmitRefundProcessedStep::<R, I, C, P>::new())
            .build()
    }

    fn finish(tenant_id: &str, result: Result<RefundOutcome>) -> Result<RefundOutcome> {
        match &result {
            Ok(outcome) => info!(
                tenant_id,
                return_number = %outcome.return_number,
                restocked = outcome.restored_inventory.len(),
                store_credit = outcome.store_credit_id.is_some(),
                "refund processed"
            ),
            Err(err) => warn!(
                tenant_id,
                kind = ?err.kind(),
                error = %err.triggering_error(),
                "refund failed"
            ),
        }
        result
    }
}
