use std::convert::Infallible;
use std::marker::PhantomData;

use async_trait::async_trait;

/// Explicit atomicity boundary wrapped around a saga invocation.
///
/// Effects a step performs through the transaction are undone by
/// `rollback`. Effects outside it (already committed sub-transactions,
/// published events) are the job of step compensations, which always run
/// before `rollback` is attempted.
#[async_trait]
pub trait TransactionBoundary: Send + Sync {
    /// Must match the error type of the saga the boundary wraps.
    type Error: Send;

    /// Open the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    async fn begin(&self) -> Result<(), Self::Error>;

    /// Make every effect since `begin` durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    async fn commit(&self) -> Result<(), Self::Error>;

    /// Discard every effect since `begin`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    async fn rollback(&self) -> Result<(), Self::Error>;
}

/// Boundary that does nothing, for sagas whose steps need no outer transaction.
pub struct NoTransaction<E = Infallible> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> NoTransaction<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for NoTransaction<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Send> TransactionBoundary for NoTransaction<E> {
    type Error = E;

    async fn begin(&self) -> Result<(), E> {
        Ok(())
    }

    async fn commit(&self) -> Result<(), E> {
        Ok(())
    }

    async fn rollback(&self) -> Result<(), E> {
        Ok(())
    }
}
