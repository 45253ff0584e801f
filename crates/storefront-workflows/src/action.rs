use serde::Serialize;

use crate::error::WorkflowError;

/// Result envelope handed to presentation layers.
///
/// On failure `error` carries the message of the error that stopped the
/// workflow, never a rollback summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResult<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: &WorkflowError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.triggering_error().to_string()),
        }
    }
}

impl<T> From<Result<T, WorkflowError>> for ActionResult<T> {
    fn from(result: Result<T, WorkflowError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failed(&err),
        }
    }
}
