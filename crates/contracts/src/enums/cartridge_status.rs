use serde::{Deserialize, Serialize};

use super::CartridgeWorkflow;

/// Статусы картриджа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartridgeStatus {
    /// Заправлен и готов к установке
    Available,
    /// Установлен в принтер
    Working,
    /// Снят с обслуживания, лежит в резерве
    Reserve,
    /// Находится в сервисном центре
    Service,
    /// Израсходован, ждет отправки на заправку
    Refill,
}

impl CartridgeStatus {
    /// Все статусы в порядке отображения
    pub const ALL: [CartridgeStatus; 5] = [
        CartridgeStatus::Available,
        CartridgeStatus::Reserve,
        CartridgeStatus::Working,
        CartridgeStatus::Service,
        CartridgeStatus::Refill,
    ];

    /// Получить код статуса (так он хранится в БД и передается по API)
    pub fn code(&self) -> &'static str {
        match self {
            CartridgeStatus::Available => "available",
            CartridgeStatus::Working => "working",
            CartridgeStatus::Reserve => "reserve",
            CartridgeStatus::Service => "service",
            CartridgeStatus::Refill => "refill",
        }
    }

    /// Получить человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            CartridgeStatus::Available => "Готовы к использованию",
            CartridgeStatus::Working => "В работе",
            CartridgeStatus::Reserve => "Сняты с обслуживания",
            CartridgeStatus::Service => "В сервисе",
            CartridgeStatus::Refill => "Требуется заправка",
        }
    }

    /// Парсинг из строки
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "available" => Some(CartridgeStatus::Available),
            "working" => Some(CartridgeStatus::Working),
            "reserve" => Some(CartridgeStatus::Reserve),
            "service" => Some(CartridgeStatus::Service),
            "refill" => Some(CartridgeStatus::Refill),
            _ => None,
        }
    }

    /// Может ли картридж в этом статусе участвовать в операции
    pub fn is_eligible_for(&self, workflow: CartridgeWorkflow) -> bool {
        workflow.eligible_statuses().contains(self)
    }
}

impl std::fmt::Display for CartridgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_parse_back() {
        for status in CartridgeStatus::ALL {
            assert_eq!(CartridgeStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(CartridgeStatus::from_code("lost"), None);
        assert_eq!(CartridgeStatus::from_code(""), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&CartridgeStatus::Refill).unwrap();
        assert_eq!(json, "\"refill\"");
        let parsed: CartridgeStatus = serde_json::from_str("\"working\"").unwrap();
        assert_eq!(parsed, CartridgeStatus::Working);
        assert!(serde_json::from_str::<CartridgeStatus>("\"broken\"").is_err());
    }

    #[test]
    fn test_eligibility() {
        use CartridgeWorkflow::*;
        assert!(CartridgeStatus::Available.is_eligible_for(Install));
        assert!(CartridgeStatus::Reserve.is_eligible_for(Install));
        assert!(!CartridgeStatus::Refill.is_eligible_for(Install));

        assert!(CartridgeStatus::Working.is_eligible_for(Remove));
        assert!(!CartridgeStatus::Available.is_eligible_for(Remove));

        assert!(CartridgeStatus::Refill.is_eligible_for(Dispatch));
        assert!(CartridgeStatus::Reserve.is_eligible_for(Dispatch));
        assert!(!CartridgeStatus::Service.is_eligible_for(Dispatch));
        assert!(!CartridgeStatus::Available.is_eligible_for(Dispatch));
    }
}
