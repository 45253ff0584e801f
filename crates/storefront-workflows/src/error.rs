use std::path::PathBuf;

use storefront_saga::{SagaError, TransactionPhase};
use thiserror::Error;

/// Details about a failed compensation during saga rollback.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The error that occurred during compensation.
    pub error: Box<WorkflowError>,
}

/// Coarse classification callers use to map errors onto their own surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Validation,
    Storage,
    EventBus,
    Configuration,
    Cancelled,
    Compensation,
}

impl ErrorKind {
    /// Whether the caller, not the system, is at fault.
    #[must_use]
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::NotFound | Self::InvalidState | Self::Validation)
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to publish event '{event}': {reason}")]
    EventBus { event: String, reason: String },

    #[error("failed to read configuration file '{path}'")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration")]
    ConfigParse(#[source] toml::de::Error),

    #[error("cannot undo step '{step}': {reason}")]
    Compensation { step: &'static str, reason: String },

    #[error("saga failed at step '{step}'")]
    SagaFailed {
        step: String,
        #[source]
        source: Box<WorkflowError>,
    },

    #[error(
        "saga failed at step '{step}' and {} compensation(s) also failed", compensation_failures.len()
    )]
    SagaCompensationFailed {
        step: String,
        #[source]
        source: Box<WorkflowError>,
        compensation_failures: Vec<CompensationFailure>,
    },

    #[error("saga cancelled before step '{next_step}'")]
    SagaCancelled {
        next_step: String,
        compensation_failures: Vec<CompensationFailure>,
    },

    #[error("transaction {phase} failed")]
    TransactionFailed {
        phase: TransactionPhase,
        #[source]
        source: Box<WorkflowError>,
        compensation_failures: Vec<CompensationFailure>,
    },
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

impl WorkflowError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// The error that caused the workflow to stop.
    ///
    /// Saga wrappers are unwrapped down to the step error, so callers see
    /// the storage or validation failure rather than the rollback summary.
    #[must_use]
    pub fn triggering_error(&self) -> &Self {
        match self {
            Self::SagaFailed { source, .. }
            | Self::SagaCompensationFailed { source, .. }
            | Self::TransactionFailed { source, .. } => source.triggering_error(),
            other => other,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.triggering_error() {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Validation(_) => ErrorKind::Validation,
            Self::EventBus { .. } => ErrorKind::EventBus,
            Self::ConfigRead { .. } | Self::ConfigParse(_) => ErrorKind::Configuration,
            Self::SagaCancelled { .. } => ErrorKind::Cancelled,
            Self::Compensation { .. } => ErrorKind::Compensation,
            Self::Storage(_)
            | Self::SagaFailed { .. }
            | Self::SagaCompensationFailed { .. }
            | Self::TransactionFailed { .. } => ErrorKind::Storage,
        }
    }

    /// Secondary failures recorded while unwinding, if any.
    #[must_use]
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        match self {
            Self::SagaCompensationFailed {
                compensation_failures,
                ..
            }
            | Self::SagaCancelled {
                compensation_failures,
                ..
            }
            | Self::TransactionFailed {
                compensation_failures,
                ..
            } => compensation_failures,
            _ => &[],
        }
    }
}

fn into_failures(
    errors: Vec<storefront_saga::CompensationError<WorkflowError>>,
) -> Vec<CompensationFailure> {
    errors
        .into_iter()
        .map(|e| CompensationFailure {
            step: e.step,
            description: e.description,
            error: Box::new(e.error),
        })
        .collect()
}

impl From<SagaError<WorkflowError>> for WorkflowError {
    fn from(err: SagaError<WorkflowError>) -> Self {
        match err {
            SagaError::StepFailed { step, source } => Self::SagaFailed {
                step,
                source: Box::new(source),
            },
            SagaError::CompensationFailed {
                failed_step,
                step_error,
                compensation_errors,
            } => Self::SagaCompensationFailed {
                step: failed_step,
                source: Box::new(step_error),
                compensation_failures: into_failures(compensation_errors),
            },
            SagaError::Cancelled {
                next_step,
                compensation_errors,
            } => Self::SagaCancelled {
                next_step,
                compensation_failures: into_failures(compensation_errors),
            },
            SagaError::TransactionFailed {
                phase,
                source,
                compensation_errors,
            } => Self::TransactionFailed {
                phase,
                source: Box::new(source),
                compensation_failures: into_failures(compensation_errors),
            },
            other => unrecognised_saga_failure(&other),
        }
    }
}

fn unrecognised_saga_failure(err: &SagaError<WorkflowError>) -> WorkflowError {
    WorkflowError::Storage(format!("unrecognised saga failure: {err:?}"))
}
