mod refund;

use std::sync::Arc;

use clap::Subcommand;
use storefront_workflows::RefundConfig;
use storefront_workflows::providers::InMemoryCommerceStore;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Refund a return and print the result as JSON
    Refund(refund::RefundArgs),
}

impl Commands {
    /// Returns whether the workflow succeeded. Workflow failures are reported
    /// on stdout; only driver failures surface as `Err`.
    pub(crate) async fn execute(
        self,
        store: Arc<InMemoryCommerceStore>,
        config: RefundConfig,
    ) -> Result<bool> {
        match self {
            Self::Refund(args) => refund::run(args, store, config).await,
        }
    }
}
