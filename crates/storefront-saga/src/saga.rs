use std::fmt::Debug;
use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::audit::{SagaAuditLog, SagaState};
use crate::context::WorkflowContext;
use crate::erased::{ErasedStep, ErasedValue};
use crate::error::{CompensationError, SagaError, TransactionPhase};
use crate::transaction::TransactionBoundary;

/// Compensation data recorded for a completed step.
struct LedgerEntry {
    index: usize,
    compensation: ErasedValue,
}

/// A compiled saga ready for execution.
///
/// Sagas execute a sequence of steps, where each step's output becomes the
/// next step's input. If any step fails, previously completed steps that
/// declared a compensation are compensated in reverse order (LIFO), and the
/// error from the failing step is returned.
pub struct Saga<Input, Output, H, Err> {
    steps: Vec<Box<dyn ErasedStep<H, Err>>>,
    _phantom: PhantomData<fn(Input) -> Output>,
}

impl<Input, Output, H, Err> Saga<Input, Output, H, Err>
where
    Input: Send + 'static,
    Output: Send + 'static,
    H: Send + Sync,
    Err: Debug + Send,
{
    pub(crate) fn from_steps(steps: Vec<Box<dyn ErasedStep<H, Err>>>) -> Self {
        Self {
            steps,
            _phantom: PhantomData,
        }
    }

    /// Names of the steps in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Execute the saga, returning the final output on success.
    ///
    /// On failure, compensates all previously completed steps in reverse order.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFailed` if a step fails and all compensations succeed.
    /// Returns `SagaError::CompensationFailed` if a step fails and some compensations also fail.
    pub async fn execute(
        &self,
        ctx: &mut WorkflowContext<H>,
        input: Input,
    ) -> Result<Output, SagaError<Err>> {
        let (result, _audit_log) = self.execute_with_audit(ctx, input).await;
        result
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log tracks all step executions, compensations and the
    /// lifecycle states the saga passed through.
    pub async fn execute_with_audit(
        &self,
        ctx: &mut WorkflowContext<H>,
        input: Input,
    ) -> (Result<Output, SagaError<Err>>, SagaAuditLog) {
        let mut audit_log = SagaAuditLog::new();
        let result = self.run(ctx, input, None, &mut audit_log).await;
        let result = result.map(|(output, _ledger)| {
            audit_log.transition(SagaState::Succeeded);
            output
        });
        (result, audit_log)
    }

    /// Execute the saga, checking `token` before every step.
    ///
    /// A step that already started is allowed to finish. Once cancellation
    /// is observed, completed steps are compensated exactly as on failure.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::Cancelled` if cancellation was observed, or any
    /// error [`execute`](Self::execute) returns.
    pub async fn execute_cancellable(
        &self,
        ctx: &mut WorkflowContext<H>,
        input: Input,
        token: &CancellationToken,
    ) -> Result<Output, SagaError<Err>> {
        let mut audit_log = SagaAuditLog::new();
        let (output, _ledger) = self.run(ctx, input, Some(token), &mut audit_log).await?;
        Ok(output)
    }

    /// Execute the saga inside an explicit transaction boundary.
    ///
    /// The boundary is opened before the first step and committed after the
    /// last. On failure the ledger is unwound first, then the boundary is
    /// rolled back. A failed rollback is reported as a compensation error of
    /// the pseudo-step `transaction`.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::TransactionFailed` if the boundary cannot begin or
    /// commit, or any error [`execute`](Self::execute) returns.
    pub async fn execute_in_transaction<T>(
        &self,
        ctx: &mut WorkflowContext<H>,
        input: Input,
        transaction: &T,
    ) -> Result<Output, SagaError<Err>>
    where
        T: TransactionBoundary<Error = Err>,
    {
        let mut audit_log = SagaAuditLog::new();

        if let Err(source) = transaction.begin().await {
            warn!(tenant_id = ctx.tenant_id(), error = ?source, "failed to begin transaction");
            return Err(SagaError::TransactionFailed {
                phase: TransactionPhase::Begin,
                source,
                compensation_errors: Vec::new(),
            });
        }

        let outcome = self.run(ctx, input, None, &mut audit_log).await;
        match outcome {
            Ok((output, ledger)) => match transaction.commit().await {
                Ok(()) => Ok(output),
                Err(source) => {
                    warn!(
                        tenant_id = ctx.tenant_id(),
                        error = ?source,
                        "transaction commit failed, unwinding saga"
                    );
                    let compensation_errors = self.rollback(ctx, &mut audit_log, ledger).await;
                    let saga_error = SagaError::TransactionFailed {
                        phase: TransactionPhase::Commit,
                        source,
                        compensation_errors,
                    };
                    Err(Self::rollback_transaction(transaction, saga_error).await)
                }
            },
            Err(saga_error) => Err(Self::rollback_transaction(transaction, saga_error).await),
        }
    }

    async fn run(
        &self,
        ctx: &mut WorkflowContext<H>,
        input: Input,
        cancellation: Option<&CancellationToken>,
        audit_log: &mut SagaAuditLog,
    ) -> Result<(Output, Vec<LedgerEntry>), SagaError<Err>> {
        audit_log.transition(SagaState::Running);

        let mut ledger: Vec<LedgerEntry> = Vec::new();
        let mut current_input: ErasedValue = Box::new(input);

        for (index, step) in self.steps.iter().enumerate() {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                warn!(
                    tenant_id = ctx.tenant_id(),
                    next_step = step.name(),
                    "saga cancelled, unwinding"
                );
                let compensation_errors = self.rollback(ctx, audit_log, ledger).await;
                return Err(SagaError::Cancelled {
                    next_step: step.name().to_string(),
                    compensation_errors,
                });
            }

            audit_log.step_started(index, step.name());
            debug!(tenant_id = ctx.tenant_id(), step = step.name(), "executing step");

            let result = step.execute_erased(ctx, current_input).await;
            match result {
                Ok(output) => {
                    audit_log.step_executed(index, step.compensation_description());
                    if let Some(compensation) = output.compensation {
                        ledger.push(LedgerEntry {
                            index,
                            compensation,
                        });
                    }
                    ctx.record_completed(step.name());
                    current_input = output.data;
                }
                Err(error) => {
                    audit_log.step_failed(index);
                    warn!(
                        tenant_id = ctx.tenant_id(),
                        step = step.name(),
                        error = ?error,
                        "step failed, unwinding saga"
                    );
                    let compensation_errors = self.rollback(ctx, audit_log, ledger).await;
                    return Err(SagaError::from_step_failure(
                        step.name(),
                        error,
                        compensation_errors,
                    ));
                }
            }
        }

        let typed_output = current_input
            .downcast::<Output>()
            .expect("type-state builder guarantees final output type");
        Ok((*typed_output, ledger))
    }

    async fn rollback(
        &self,
        ctx: &WorkflowContext<H>,
        audit_log: &mut SagaAuditLog,
        mut ledger: Vec<LedgerEntry>,
    ) -> Vec<CompensationError<Err>> {
        audit_log.transition(SagaState::RollingBack);
        let mut compensation_errors = Vec::new();

        while let Some(LedgerEntry {
            index,
            compensation,
        }) = ledger.pop()
        {
            let step = &self.steps[index];
            let step_name = step.name();
            let description = step
                .compensation_description()
                .unwrap_or_else(|| format!("undo {step_name}"));

            debug!(tenant_id = ctx.tenant_id(), step = step_name, "compensating step");

            let result = step.compensate_erased(ctx, compensation).await;
            match result {
                Ok(()) => {
                    audit_log.step_compensated(index, true);
                }
                Err(err) => {
                    error!(
                        tenant_id = ctx.tenant_id(),
                        step = step_name,
                        error = ?err,
                        "compensation failed, continuing rollback"
                    );
                    audit_log.step_compensated(index, false);
                    compensation_errors.push(CompensationError {
                        step: step_name.to_string(),
                        description,
                        error: err,
                    });
                }
            }
        }

        audit_log.transition(SagaState::Failed);
        compensation_errors
    }

    async fn rollback_transaction<T>(transaction: &T, saga_error: SagaError<Err>) -> SagaError<Err>
    where
        T: TransactionBoundary<Error = Err>,
    {
        match transaction.rollback().await {
            Ok(()) => saga_error,
            Err(err) => {
                error!(error = ?err, "transaction rollback failed");
                saga_error.with_compensation_error(CompensationError {
                    step: "transaction".to_string(),
                    description: "roll back transaction".to_string(),
                    error: err,
                })
            }
        }
    }
}
