use serde::{Deserialize, Serialize};

use super::CartridgeStatus;

/// Операции, для которых отбираются картриджи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartridgeWorkflow {
    /// Установка при замене
    Install,
    /// Снятие при замене
    Remove,
    /// Отправка в сервис
    Dispatch,
}

impl CartridgeWorkflow {
    /// Статусы, допустимые для операции
    pub fn eligible_statuses(&self) -> &'static [CartridgeStatus] {
        match self {
            CartridgeWorkflow::Install => &[CartridgeStatus::Available, CartridgeStatus::Reserve],
            CartridgeWorkflow::Remove => &[CartridgeStatus::Working],
            CartridgeWorkflow::Dispatch => &[CartridgeStatus::Refill, CartridgeStatus::Reserve],
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CartridgeWorkflow::Install => "install",
            CartridgeWorkflow::Remove => "remove",
            CartridgeWorkflow::Dispatch => "dispatch",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "install" => Some(CartridgeWorkflow::Install),
            "remove" => Some(CartridgeWorkflow::Remove),
            "dispatch" => Some(CartridgeWorkflow::Dispatch),
            _ => None,
        }
    }
}
