mod event_publisher;
mod inventory;
mod returns;
mod store_credit;

pub use event_publisher::EventPublisher;
pub use inventory::InventoryRepository;
pub use returns::{ReturnRepository, ReturnUpdate};
pub use store_credit::StoreCreditRepository;
