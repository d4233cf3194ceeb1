pub mod batch_status;
pub mod cartridge_status;
pub mod cartridge_workflow;

pub use batch_status::{BatchListFilter, BatchStatus};
pub use cartridge_status::CartridgeStatus;
pub use cartridge_workflow::CartridgeWorkflow;
