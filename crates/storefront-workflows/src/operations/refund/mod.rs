mod context;
mod operation;
mod saga_data;
mod saga_steps;

pub use context::RefundServices;
pub use operation::RefundOperation;
pub use saga_data::{
    InventoryRestoration, PreviousReturnState, RefundInput, RefundOutcome, RefundSagaData,
};
pub use saga_steps::{
    CreateStoreCreditStep, EmitRefundProcessedStep, RestoreInventoryStep, UpdateReturnStatusStep,
    ValidateRefundStep,
};
