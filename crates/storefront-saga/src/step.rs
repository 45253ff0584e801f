use async_trait::async_trait;

use crate::context::WorkflowContext;

/// A step in a saga that records no undoable effect.
///
/// Validation and read-only steps implement this trait. Nothing is pushed to
/// the rollback ledger when such a step completes, and a failure aborts the
/// saga without needing to undo the step itself.
///
/// # Type Parameters
///
/// - `Input`: Data received from the previous step (or saga entry point)
/// - `Output`: Data produced for the next step
/// - `Handle`: Shared collaborators reachable through the [`WorkflowContext`]
/// - `Error`: The error type for step failures
#[async_trait]
pub trait SagaStep: Send + Sync {
    /// Data received from the previous step or saga entry point.
    type Input: Send + 'static;

    /// Data produced for the next step.
    type Output: Send + 'static;

    /// Collaborator handle stored in the workflow context.
    type Handle: Send + Sync;

    /// Error type for step failures.
    type Error: Send;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Execute the step, transforming input into output.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    async fn execute(
        &self,
        ctx: &WorkflowContext<Self::Handle>,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error>;
}

/// Forward result of a [`CompensableStep`], paired with its rollback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compensable<T, C> {
    /// Output handed to the next step.
    pub data: T,
    /// Whatever the compensation needs to undo this step's effect.
    pub compensation: C,
}

impl<T, C> Compensable<T, C> {
    #[must_use]
    pub fn new(data: T, compensation: C) -> Self {
        Self { data, compensation }
    }
}

/// A step whose side effect can be undone if a later step fails.
///
/// `execute` returns the forward output together with the minimal data the
/// rollback needs (previous quantity, created record id, ...). The
/// orchestrator owns that data until the saga finishes and hands it back to
/// `compensate` during rollback.
#[async_trait]
pub trait CompensableStep: Send + Sync {
    /// Data received from the previous step or saga entry point.
    type Input: Send + 'static;

    /// Data produced for the next step.
    type Output: Send + 'static;

    /// Data recorded in the rollback ledger for this step.
    type Compensation: Send + 'static;

    /// Collaborator handle stored in the workflow context.
    type Handle: Send + Sync;

    /// Error type for step and compensation failures.
    type Error: Send;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Execute the step, returning its output and compensation data.
    ///
    /// # Errors
    ///
    /// Returns an error if the step fails to complete.
    async fn execute(
        &self,
        ctx: &WorkflowContext<Self::Handle>,
        input: Self::Input,
    ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error>;

    /// Compensate (undo) the step's effects.
    ///
    /// Called at most once, during rollback, when a later step fails. Must be
    /// a no-op for empty compensation data and should not fail when the
    /// effect has already been reverted.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails.
    async fn compensate(
        &self,
        ctx: &WorkflowContext<Self::Handle>,
        compensation: Self::Compensation,
    ) -> Result<(), Self::Error>;

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
