use std::fmt::{self, Debug};

use thiserror::Error;

/// Error from a failed compensation operation.
#[derive(Debug, thiserror::Error)]
#[error("compensation failed for step '{step}': {description}")]
pub struct CompensationError<E> {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Phase of an explicit transaction boundary that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Begin,
    Commit,
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => f.write_str("begin"),
            Self::Commit => f.write_str("commit"),
        }
    }
}

/// Error from saga execution.
///
/// Whatever the variant, the error that triggered the rollback is kept as the
/// primary error. Compensation failures are secondary and only reported
/// alongside it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E: Debug> {
    /// A step failed and all compensations succeeded.
    #[error("step '{step}' failed")]
    StepFailed {
        /// Name of the step that failed.
        step: String,
        /// The error that caused the step to fail.
        #[source]
        source: E,
    },

    /// A step failed and some compensations also failed.
    #[error("step '{failed_step}' failed, and {} compensation(s) also failed", compensation_errors.len())]
    CompensationFailed {
        /// Name of the step that originally failed.
        failed_step: String,
        /// The error from the failed step.
        step_error: E,
        /// Errors from failed compensations.
        compensation_errors: Vec<CompensationError<E>>,
    },

    /// Cancellation was observed before a step started.
    #[error("saga cancelled before step '{next_step}'")]
    Cancelled {
        /// Step that would have run next.
        next_step: String,
        /// Errors from failed compensations.
        compensation_errors: Vec<CompensationError<E>>,
    },

    /// The explicit transaction boundary could not begin or commit.
    #[error("transaction {phase} failed")]
    TransactionFailed {
        phase: TransactionPhase,
        #[source]
        source: E,
        /// Errors from failed compensations.
        compensation_errors: Vec<CompensationError<E>>,
    },
}

impl<E: Debug> SagaError<E> {
    pub(crate) fn from_step_failure(
        step: &str,
        step_error: E,
        compensation_errors: Vec<CompensationError<E>>,
    ) -> Self {
        if compensation_errors.is_empty() {
            Self::StepFailed {
                step: step.to_string(),
                source: step_error,
            }
        } else {
            Self::CompensationFailed {
                failed_step: step.to_string(),
                step_error,
                compensation_errors,
            }
        }
    }

    /// Attach a compensation failure observed after the error was built.
    pub(crate) fn with_compensation_error(self, error: CompensationError<E>) -> Self {
        match self {
            Self::StepFailed { step, source } => Self::CompensationFailed {
                failed_step: step,
                step_error: source,
                compensation_errors: vec![error],
            },
            Self::CompensationFailed {
                failed_step,
                step_error,
                mut compensation_errors,
            } => {
                compensation_errors.push(error);
                Self::CompensationFailed {
                    failed_step,
                    step_error,
                    compensation_errors,
                }
            }
            Self::Cancelled {
                next_step,
                mut compensation_errors,
            } => {
                compensation_errors.push(error);
                Self::Cancelled {
                    next_step,
                    compensation_errors,
                }
            }
            Self::TransactionFailed {
                phase,
                source,
                mut compensation_errors,
            } => {
                compensation_errors.push(error);
                Self::TransactionFailed {
                    phase,
                    source,
                    compensation_errors,
                }
            }
        }
    }

    /// Name of the step (or transaction phase) that triggered the failure.
    #[must_use]
    pub fn failed_step(&self) -> &str {
        match self {
            Self::StepFailed { step, .. } => step,
            Self::CompensationFailed { failed_step, .. } => failed_step,
            Self::Cancelled { next_step, .. } => next_step,
            Self::TransactionFailed { phase, .. } => match phase {
                TransactionPhase::Begin => "begin_transaction",
                TransactionPhase::Commit => "commit_transaction",
            },
        }
    }

    /// The error that triggered the rollback, if any.
    ///
    /// `None` only for cancellation, which has no triggering error.
    #[must_use]
    pub fn step_error(&self) -> Option<&E> {
        match self {
            Self::StepFailed { source, .. } | Self::TransactionFailed { source, .. } => {
                Some(source)
            }
            Self::CompensationFailed { step_error, .. } => Some(step_error),
            Self::Cancelled { .. } => None,
        }
    }

    /// Consume the saga error, returning the triggering error.
    #[must_use]
    pub fn into_step_error(self) -> Option<E> {
        match self {
            Self::StepFailed { source, .. } | Self::TransactionFailed { source, .. } => {
                Some(source)
            }
            Self::CompensationFailed { step_error, .. } => Some(step_error),
            Self::Cancelled { .. } => None,
        }
    }

    /// Secondary failures recorded while unwinding.
    #[must_use]
    pub fn compensation_errors(&self) -> &[CompensationError<E>] {
        match self {
            Self::StepFailed { .. } => &[],
            Self::CompensationFailed {
                compensation_errors,
                ..
            }
            | Self::Cancelled {
                compensation_errors,
                ..
            }
            | Self::TransactionFailed {
                compensation_errors,
                ..
            } => compensation_errors,
        }
    }
}
