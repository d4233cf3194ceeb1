pub mod a001_cartridge;
pub mod a002_cartridge_replacement;
pub mod a003_service_batch;
pub mod error;
