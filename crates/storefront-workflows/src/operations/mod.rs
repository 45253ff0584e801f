pub mod refund;

pub use refund::{RefundInput, RefundOperation, RefundOutcome};
