mod action;
pub mod config;
mod error;
pub mod operations;
pub mod providers;
pub mod traits;

#[cfg(test)]
pub mod mocks;

pub use action::ActionResult;
pub use config::RefundConfig;
pub use error::{CompensationFailure, ErrorKind, Result, WorkflowError};
