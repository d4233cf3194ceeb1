pub mod aggregate;

pub use aggregate::{
    Cartridge, CartridgeDto, CartridgeId, CartridgeStatusChange, SetStatusDto,
    StatusChangeSource, StatusCount, StatusSummary,
};
