use std::sync::Arc;

use crate::config::RefundConfig;
use crate::traits::{EventPublisher, InventoryRepository, ReturnRepository, StoreCreditRepository};

/// Collaborators shared by every refund step, carried as the workflow handle.
pub struct RefundServices<R, I, C, P> {
    returns: Arc<R>,
    inventory: Arc<I>,
    credits: Arc<C>,
    events: Arc<P>,
    config: Arc<RefundConfig>,
}

impl<R, I, C, P> Clone for RefundServices<R, I, C, P> {
    fn clone(&self) -> Self {
        Self {
            returns: Arc::clone(&self.returns),
            inventory: Arc::clone(&self.inventory),
            credits: Arc::clone(&self.credits),
            events: Arc::clone(&self.events),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, I, C, P> RefundServices<R, I, C, P>
where
    R: ReturnRepository,
    I: InventoryRepository,
    C: StoreCreditRepository,
    P: EventPublisher,
{
    pub fn new(
        returns: Arc<R>,
        inventory: Arc<I>,
        credits: Arc<C>,
        events: Arc<P>,
        config: Arc<RefundConfig>,
    ) -> Self {
        Self {
            returns,
            inventory,
            credits,
            events,
            config,
        }
    }

    #[must_use]
    pub fn returns(&self) -> &R {
        &self.returns
    }

    #[must_use]
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    #[must_use]
    pub fn credits(&self) -> &C {
        &self.credits
    }

    #[must_use]
    pub fn events(&self) -> &P {
        &self.events
    }

    #[must_use]
    pub fn config(&self) -> &RefundConfig {
        &self.config
    }
}
