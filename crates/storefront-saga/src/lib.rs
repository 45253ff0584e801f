//! Saga pattern for multi-step storefront workflows.
//!
//! This crate provides infrastructure for executing an ordered list of steps
//! against a shared [`WorkflowContext`]. Each step's output becomes the next
//! step's input. Steps that perform undoable side effects return compensation
//! data alongside their output; if a later step fails, that data is handed
//! back to the step's compensation in reverse order of completion before the
//! original error is returned to the caller.

mod audit;
mod builder;
mod context;
mod erased;
mod error;
mod saga;
mod step;
mod transaction;

pub use audit::{SagaAuditLog, SagaState, StepRecord, StepStatus};
pub use builder::{Empty, HasSteps, SagaBuilder};
pub use context::WorkflowContext;
pub use error::{CompensationError, SagaError, TransactionPhase};
pub use saga::Saga;
pub use step::{Compensable, CompensableStep, SagaStep};
pub use tokio_util::sync::CancellationToken;
pub use transaction::{NoTransaction, TransactionBoundary};
