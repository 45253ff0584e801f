pub mod error;
mod money;
pub mod types;

pub use error::*;
pub use money::Money;
pub use types::*;
