use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use crate::enums::CartridgeStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор картриджа
    CartridgeId
);

// ============================================================================
// Aggregate Root
// ============================================================================

/// Картридж (учетная единица с инвентарным номером)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cartridge {
    #[serde(flatten)]
    pub base: BaseAggregate<CartridgeId>,

    /// Инвентарный номер, например "МК101"
    pub number: String,

    /// Модель (артикул), например "CE505A"
    pub model: String,

    pub status: CartridgeStatus,

    /// Дата возврата из сервиса
    #[serde(rename = "returnDate")]
    pub return_date: Option<NaiveDate>,

    /// Ответственный за прием из сервиса
    #[serde(rename = "returnResponsible")]
    pub return_responsible: Option<String>,
}

impl Cartridge {
    /// Создать новый картридж для вставки в БД (статус "available")
    pub fn new_for_insert(number: String, model: String, comment: Option<String>) -> Self {
        Self::new_with_status(number, model, comment, CartridgeStatus::Available)
    }

    /// Создать картридж с заданным начальным статусом (демо-данные)
    pub fn new_with_status(
        number: String,
        model: String,
        comment: Option<String>,
        status: CartridgeStatus,
    ) -> Self {
        let mut base = BaseAggregate::new(CartridgeId::new_v4());
        base.set_comment(comment);

        Self {
            base,
            number: number.trim().to_string(),
            model: model.trim().to_string(),
            status,
            return_date: None,
            return_responsible: None,
        }
    }

    /// Получить ID как строку
    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Сменить статус, возвращает предыдущий
    pub fn change_status(&mut self, status: CartridgeStatus) -> CartridgeStatus {
        let previous = self.status;
        self.status = status;
        self.base.touch();
        previous
    }

    /// Отметить прием из сервиса
    pub fn mark_returned(&mut self, return_date: NaiveDate, responsible: &str) {
        self.return_date = Some(return_date);
        self.return_responsible = Some(responsible.to_string());
        self.base.touch();
    }

    /// Поиск по номеру или модели без учета регистра
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.number.to_lowercase().contains(&term) || self.model.to_lowercase().contains(&term)
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.number.trim().is_empty() {
            return Err("Номер картриджа не может быть пустым".into());
        }
        if self.model.trim().is_empty() {
            return Err("Модель картриджа не может быть пустой".into());
        }
        if self.number.chars().count() > 32 {
            return Err("Номер картриджа не может быть длиннее 32 символов".into());
        }
        Ok(())
    }
}

impl AggregateRoot for Cartridge {
    type Id = CartridgeId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "cartridge"
    }

    fn element_name() -> &'static str {
        "Картридж"
    }
}

// ============================================================================
// Status history
// ============================================================================

/// Источник смены статуса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChangeSource {
    /// Ручная смена статуса из меню
    Manual,
    Replacement,
    Dispatch,
    Return,
}

impl StatusChangeSource {
    pub fn code(&self) -> &'static str {
        match self {
            StatusChangeSource::Manual => "manual",
            StatusChangeSource::Replacement => "replacement",
            StatusChangeSource::Dispatch => "dispatch",
            StatusChangeSource::Return => "return",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StatusChangeSource::Manual => "Вручную",
            StatusChangeSource::Replacement => "Замена картриджа",
            StatusChangeSource::Dispatch => "Отправка в сервис",
            StatusChangeSource::Return => "Прием из сервиса",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "manual" => Some(StatusChangeSource::Manual),
            "replacement" => Some(StatusChangeSource::Replacement),
            "dispatch" => Some(StatusChangeSource::Dispatch),
            "return" => Some(StatusChangeSource::Return),
            _ => None,
        }
    }
}

/// Запись журнала смены статусов (только добавление)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartridgeStatusChange {
    pub id: Uuid,

    #[serde(rename = "cartridgeId")]
    pub cartridge_id: CartridgeId,

    #[serde(rename = "fromStatus")]
    pub from_status: CartridgeStatus,

    #[serde(rename = "toStatus")]
    pub to_status: CartridgeStatus,

    pub source: StatusChangeSource,

    #[serde(rename = "changedAt")]
    pub changed_at: DateTime<Utc>,
}

impl CartridgeStatusChange {
    pub fn new(
        cartridge_id: CartridgeId,
        from_status: CartridgeStatus,
        to_status: CartridgeStatus,
        source: StatusChangeSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cartridge_id,
            from_status,
            to_status,
            source,
            changed_at: Utc::now(),
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Количество картриджей в одном статусе
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: CartridgeStatus,
    pub label: String,
    pub count: usize,
}

/// Сводка по статусам для карточек статистики
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub items: Vec<StatusCount>,
    pub total: usize,
}

impl StatusSummary {
    /// Подсчет по всем пяти статусам, включая пустые
    pub fn from_cartridges(cartridges: &[Cartridge]) -> Self {
        let items = CartridgeStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                label: status.display_name().to_string(),
                count: cartridges.iter().filter(|c| c.status == *status).count(),
            })
            .collect();

        Self {
            items,
            total: cartridges.len(),
        }
    }

    pub fn count(&self, status: CartridgeStatus) -> usize {
        self.items
            .iter()
            .find(|item| item.status == status)
            .map(|item| item.count)
            .unwrap_or(0)
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания картриджа
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CartridgeDto {
    pub number: String,
    pub model: String,
    pub comment: Option<String>,
}

/// DTO для ручной смены статуса
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusDto {
    pub status: CartridgeStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cartridge(number: &str, model: &str, status: CartridgeStatus) -> Cartridge {
        Cartridge::new_with_status(number.into(), model.into(), None, status)
    }

    #[test]
    fn test_new_cartridge_is_available_and_trimmed() {
        let c = Cartridge::new_for_insert("  МК101 ".into(), "CE505A ".into(), None);
        assert_eq!(c.status, CartridgeStatus::Available);
        assert_eq!(c.number, "МК101");
        assert_eq!(c.model, "CE505A");
        assert!(c.base.metadata.is_new());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(cartridge(" ", "CE505A", CartridgeStatus::Available)
            .validate()
            .is_err());
        assert!(cartridge("МК101", "", CartridgeStatus::Available)
            .validate()
            .is_err());
    }

    #[test]
    fn test_change_status_returns_previous() {
        let mut c = cartridge("МК103", "CF280A", CartridgeStatus::Working);
        let previous = c.change_status(CartridgeStatus::Refill);
        assert_eq!(previous, CartridgeStatus::Working);
        assert_eq!(c.status, CartridgeStatus::Refill);
    }

    #[test]
    fn test_matches_search_is_case_insensitive() {
        let c = cartridge("МК101", "CE505A", CartridgeStatus::Available);
        assert!(c.matches_search("мк10"));
        assert!(c.matches_search("ce505"));
        assert!(c.matches_search(""));
        assert!(!c.matches_search("CF280"));
    }

    #[test]
    fn test_summary_counts_every_status() {
        let cartridges = vec![
            cartridge("МК101", "CE505A", CartridgeStatus::Available),
            cartridge("МК102", "CE505A", CartridgeStatus::Available),
            cartridge("МК103", "CF280A", CartridgeStatus::Working),
        ];
        let summary = StatusSummary::from_cartridges(&cartridges);
        assert_eq!(summary.items.len(), 5);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(CartridgeStatus::Available), 2);
        assert_eq!(summary.count(CartridgeStatus::Working), 1);
        assert_eq!(summary.count(CartridgeStatus::Service), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let c = cartridge("МК101", "CE505A", CartridgeStatus::Reserve);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["number"], "МК101");
        assert_eq!(json["status"], "reserve");
        assert_eq!(json["id"], c.to_string_id());
        assert!(json["returnDate"].is_null());
    }
}
