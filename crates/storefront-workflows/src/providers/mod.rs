mod events;
mod memory;
mod transaction;

pub use events::BroadcastEventPublisher;
pub use memory::{InMemoryCommerceStore, SeedData};
pub use transaction::SnapshotTransaction;
