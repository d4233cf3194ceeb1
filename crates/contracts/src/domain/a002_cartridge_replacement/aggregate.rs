use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор записи о замене
    CartridgeReplacementId
);

/// Запись журнала замен картриджей
///
/// Создается один раз и больше не меняется.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartridgeReplacement {
    #[serde(flatten)]
    pub base: BaseAggregate<CartridgeReplacementId>,

    pub date: NaiveDate,

    pub department: String,

    #[serde(rename = "installedCartridgeNumber")]
    pub installed_cartridge_number: String,

    #[serde(rename = "removedCartridgeNumber")]
    pub removed_cartridge_number: String,

    pub responsible: String,
}

impl CartridgeReplacement {
    pub fn new_for_insert(dto: &CartridgeReplacementDto) -> Self {
        Self {
            base: BaseAggregate::new(CartridgeReplacementId::new_v4()),
            date: dto.date,
            department: dto.department.trim().to_string(),
            installed_cartridge_number: dto.installed_cartridge_number.trim().to_string(),
            removed_cartridge_number: dto.removed_cartridge_number.trim().to_string(),
            responsible: dto.responsible.trim().to_string(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.metadata.created_at
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.department.is_empty() {
            return Err("Подразделение обязательно".into());
        }
        if self.installed_cartridge_number.is_empty() {
            return Err("Выберите устанавливаемый картридж".into());
        }
        if self.removed_cartridge_number.is_empty() {
            return Err("Выберите снимаемый картридж".into());
        }
        if self.installed_cartridge_number == self.removed_cartridge_number {
            return Err("Устанавливаемый и снимаемый картридж совпадают".into());
        }
        if self.responsible.is_empty() {
            return Err("Ответственный обязателен".into());
        }
        Ok(())
    }
}

impl AggregateRoot for CartridgeReplacement {
    type Id = CartridgeReplacementId;

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
        "a002"
    }

    fn collection_name() -> &'static str {
        "cartridge_replacement"
    }

    fn element_name() -> &'static str {
        "Замена картриджа"
    }
}

/// DTO формы замены картриджа
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartridgeReplacementDto {
    pub date: NaiveDate,
    pub department: String,
    pub installed_cartridge_number: String,
    pub removed_cartridge_number: String,
    pub responsible: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CartridgeReplacementDto {
        CartridgeReplacementDto {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            department: "Бухгалтерия".into(),
            installed_cartridge_number: " МК101 ".into(),
            removed_cartridge_number: "МК103".into(),
            responsible: "Иванов И.И.".into(),
        }
    }

    #[test]
    fn test_new_replacement_trims_input() {
        let r = CartridgeReplacement::new_for_insert(&dto());
        assert_eq!(r.installed_cartridge_number, "МК101");
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_fields() {
        let mut d = dto();
        d.responsible = "   ".into();
        assert!(CartridgeReplacement::new_for_insert(&d).validate().is_err());

        let mut d = dto();
        d.removed_cartridge_number = "МК101".into();
        assert!(CartridgeReplacement::new_for_insert(&d).validate().is_err());
    }

    #[test]
    fn test_dto_accepts_camel_case() {
        let json = r#"{
            "date": "2024-01-15",
            "department": "IT отдел",
            "installedCartridgeNumber": "МК101",
            "removedCartridgeNumber": "МК103",
            "responsible": "X"
        }"#;
        let d: CartridgeReplacementDto = serde_json::from_str(json).unwrap();
        assert_eq!(d.department, "IT отдел");
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }
}
