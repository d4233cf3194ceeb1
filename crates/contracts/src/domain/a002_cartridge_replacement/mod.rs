pub mod aggregate;

pub use aggregate::{CartridgeReplacement, CartridgeReplacementDto, CartridgeReplacementId};
