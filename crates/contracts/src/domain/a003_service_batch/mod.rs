pub mod aggregate;
pub mod manifest;

pub use aggregate::{
    BatchCartridge, BatchProgress, BatchSummary, CartridgeReturn, CreateServiceBatchDto,
    ReceiveCartridgesDto, ServiceBatch, ServiceBatchId,
};
pub use manifest::{BatchManifest, ManifestRow};
