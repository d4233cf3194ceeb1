use crate::domain::a001_cartridge::{Cartridge, CartridgeId};
use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use crate::enums::{BatchStatus, CartridgeStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор партии
    ServiceBatchId
);

// ============================================================================
// Member snapshot / return record
// ============================================================================

/// Снимок картриджа в составе партии
///
/// Состав партии фиксируется при отправке; меняются только статус
/// и данные о приеме.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCartridge {
    #[serde(rename = "cartridgeId")]
    pub cartridge_id: CartridgeId,

    pub number: String,

    pub model: String,

    /// Статус до отправки (refill или reserve)
    #[serde(rename = "priorStatus")]
    pub prior_status: CartridgeStatus,

    /// service до приема, available после
    pub status: CartridgeStatus,

    #[serde(rename = "returnDate")]
    pub return_date: Option<NaiveDate>,

    #[serde(rename = "returnResponsible")]
    pub return_responsible: Option<String>,
}

impl BatchCartridge {
    /// Снимок картриджа в момент отправки в сервис
    pub fn dispatched(cartridge: &Cartridge) -> Self {
        Self {
            cartridge_id: cartridge.base.id,
            number: cartridge.number.clone(),
            model: cartridge.model.clone(),
            prior_status: cartridge.status,
            status: CartridgeStatus::Service,
            return_date: None,
            return_responsible: None,
        }
    }

    /// Картридж еще в сервисе
    pub fn is_pending(&self) -> bool {
        self.status == CartridgeStatus::Service
    }
}

/// Запись о приеме одного картриджа из сервиса
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartridgeReturn {
    #[serde(rename = "cartridgeId")]
    pub cartridge_id: CartridgeId,

    #[serde(rename = "returnDate")]
    pub return_date: NaiveDate,

    pub responsible: String,

    pub notes: Option<String>,
}

/// Счетчики возврата по партии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    pub returned: usize,
    pub pending: usize,
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Партия картриджей, отправленная в сервис
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBatch {
    #[serde(flatten)]
    pub base: BaseAggregate<ServiceBatchId>,

    #[serde(rename = "batchNumber")]
    pub batch_number: String,

    /// Дата отправки
    pub date: NaiveDate,

    pub responsible: String,

    pub notes: Option<String>,

    pub status: BatchStatus,

    pub cartridges: Vec<BatchCartridge>,

    #[serde(rename = "returnedCartridges", default)]
    pub returned_cartridges: Vec<CartridgeId>,

    #[serde(rename = "partialReturnDate")]
    pub partial_return_date: Option<NaiveDate>,

    #[serde(rename = "partialReturnResponsible")]
    pub partial_return_responsible: Option<String>,

    #[serde(rename = "cartridgeReturns", default)]
    pub cartridge_returns: Vec<CartridgeReturn>,
}

impl ServiceBatch {
    /// Новая партия в статусе in_progress
    pub fn new_for_insert(
        batch_number: String,
        date: NaiveDate,
        responsible: String,
        notes: Option<String>,
        cartridges: Vec<BatchCartridge>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(ServiceBatchId::new_v4()),
            batch_number: batch_number.trim().to_string(),
            date,
            responsible: responsible.trim().to_string(),
            notes: normalize_notes(notes),
            status: BatchStatus::InProgress,
            cartridges,
            returned_cartridges: Vec::new(),
            partial_return_date: None,
            partial_return_responsible: None,
            cartridge_returns: Vec::new(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.base.metadata.created_at
    }

    /// Найти картридж в составе партии
    pub fn member(&self, cartridge_id: CartridgeId) -> Option<&BatchCartridge> {
        self.cartridges
            .iter()
            .find(|c| c.cartridge_id == cartridge_id)
    }

    pub fn member_ids(&self) -> Vec<CartridgeId> {
        self.cartridges.iter().map(|c| c.cartridge_id).collect()
    }

    /// Картриджи, которые еще не приняты из сервиса
    pub fn pending_cartridges(&self) -> Vec<&BatchCartridge> {
        self.cartridges.iter().filter(|c| c.is_pending()).collect()
    }

    pub fn remaining_count(&self) -> usize {
        self.cartridges.iter().filter(|c| c.is_pending()).count()
    }

    pub fn progress(&self) -> BatchProgress {
        let total = self.cartridges.len();
        let pending = self.remaining_count();
        BatchProgress {
            total,
            returned: total - pending,
            pending,
        }
    }

    /// Запись о приеме конкретного картриджа
    pub fn return_info(&self, cartridge_id: CartridgeId) -> Option<&CartridgeReturn> {
        self.cartridge_returns
            .iter()
            .find(|r| r.cartridge_id == cartridge_id)
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Применить прием картриджей
    ///
    /// Вызывающий код проверяет предусловия: партия открыта, каждый
    /// картридж входит в партию и еще в сервисе. Картриджи, которые
    /// уже приняты, пропускаются. Возвращает новый статус партии.
    pub fn record_receipt(&mut self, receipt: &ReceiveCartridgesDto) -> BatchStatus {
        let responsible = receipt.responsible.trim().to_string();
        let notes = normalize_notes(receipt.notes.clone());

        for cartridge_id in &receipt.cartridge_ids {
            let Some(member) = self
                .cartridges
                .iter_mut()
                .find(|c| c.cartridge_id == *cartridge_id && c.is_pending())
            else {
                continue;
            };

            member.status = CartridgeStatus::Available;
            member.return_date = Some(receipt.return_date);
            member.return_responsible = Some(responsible.clone());

            self.cartridge_returns.push(CartridgeReturn {
                cartridge_id: *cartridge_id,
                return_date: receipt.return_date,
                responsible: responsible.clone(),
                notes: notes.clone(),
            });

            if !self.returned_cartridges.contains(cartridge_id) {
                self.returned_cartridges.push(*cartridge_id);
            }
        }

        if self.remaining_count() == 0 {
            self.status = BatchStatus::Completed;
        } else {
            self.status = BatchStatus::PartialReturn;
            self.partial_return_date = Some(receipt.return_date);
            self.partial_return_responsible = Some(responsible);
        }

        self.base.touch();
        self.status
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_number.is_empty() {
            return Err("Номер партии не может быть пустым".into());
        }
        if self.responsible.is_empty() {
            return Err("Ответственный обязателен".into());
        }
        if self.cartridges.is_empty() {
            return Err("Выберите хотя бы один картридж для отправки".into());
        }
        let mut seen = HashSet::new();
        for c in &self.cartridges {
            if !seen.insert(c.cartridge_id) {
                return Err(format!("Картридж {} указан в партии дважды", c.number));
            }
        }
        Ok(())
    }
}

impl AggregateRoot for ServiceBatch {
    type Id = ServiceBatchId;

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
        "a003"
    }

    fn collection_name() -> &'static str {
        "service_batch"
    }

    fn element_name() -> &'static str {
        "Партия в сервис"
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

// ============================================================================
// Summary
// ============================================================================

/// Сводка по партиям
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// in_progress и partial_return
    pub open: usize,
    pub completed: usize,
    pub total: usize,
}

impl BatchSummary {
    pub fn from_batches(batches: &[ServiceBatch]) -> Self {
        let open = batches.iter().filter(|b| b.status.is_open()).count();
        Self {
            open,
            completed: batches.len() - open,
            total: batches.len(),
        }
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO формы отправки в сервис
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceBatchDto {
    /// Если не задан, номер генерируется автоматически
    pub batch_number: Option<String>,
    pub date: NaiveDate,
    pub responsible: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub cartridge_ids: Vec<CartridgeId>,
    /// Отправить все картриджи, доступные на момент запроса
    #[serde(default)]
    pub select_all: bool,
}

/// DTO формы приема из сервиса
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveCartridgesDto {
    pub return_date: NaiveDate,
    pub responsible: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub cartridge_ids: Vec<CartridgeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn batch_of(numbers: &[&str]) -> ServiceBatch {
        let members = numbers
            .iter()
            .map(|n| {
                let c = Cartridge::new_with_status(
                    n.to_string(),
                    "CE505A".into(),
                    None,
                    CartridgeStatus::Refill,
                );
                BatchCartridge::dispatched(&c)
            })
            .collect();
        ServiceBatch::new_for_insert(
            "SB-001234".into(),
            date(15),
            "Иванов И.И.".into(),
            Some("Срочная заправка".into()),
            members,
        )
    }

    fn receipt(ids: Vec<CartridgeId>, day: u32) -> ReceiveCartridgesDto {
        ReceiveCartridgesDto {
            return_date: date(day),
            responsible: "Морозов М.М.".into(),
            notes: Some("Заправлен полностью".into()),
            cartridge_ids: ids,
        }
    }

    #[test]
    fn test_dispatched_snapshot_keeps_prior_status() {
        let batch = batch_of(&["МК101", "МК102"]);
        assert_eq!(batch.status, BatchStatus::InProgress);
        assert!(batch
            .cartridges
            .iter()
            .all(|c| c.prior_status == CartridgeStatus::Refill
                && c.status == CartridgeStatus::Service));
        assert_eq!(batch.progress().pending, 2);
    }

    #[test]
    fn test_partial_then_full_receipt() {
        let mut batch = batch_of(&["МК101", "МК102", "МК103"]);
        let ids = batch.member_ids();

        let status = batch.record_receipt(&receipt(vec![ids[0]], 18));
        assert_eq!(status, BatchStatus::PartialReturn);
        assert_eq!(batch.returned_cartridges, vec![ids[0]]);
        assert_eq!(batch.partial_return_date, Some(date(18)));
        assert_eq!(batch.partial_return_responsible.as_deref(), Some("Морозов М.М."));
        assert_eq!(
            batch.progress(),
            BatchProgress {
                total: 3,
                returned: 1,
                pending: 2
            }
        );

        let status = batch.record_receipt(&receipt(vec![ids[1], ids[2]], 20));
        assert_eq!(status, BatchStatus::Completed);
        assert_eq!(batch.remaining_count(), 0);
        assert_eq!(batch.cartridge_returns.len(), 3);
        assert_eq!(batch.returned_cartridges.len(), 3);
        assert_eq!(batch.return_info(ids[2]).unwrap().return_date, date(20));
        // состав партии не меняется
        assert_eq!(batch.member_ids(), ids);
    }

    #[test]
    fn test_receipt_skips_already_returned() {
        let mut batch = batch_of(&["МК101", "МК102"]);
        let ids = batch.member_ids();
        batch.record_receipt(&receipt(vec![ids[0]], 18));
        batch.record_receipt(&receipt(vec![ids[0]], 19));
        assert_eq!(batch.cartridge_returns.len(), 1);
        assert_eq!(batch.member(ids[0]).unwrap().return_date, Some(date(18)));
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        let mut batch = batch_of(&[]);
        assert!(batch.validate().is_err());

        batch = batch_of(&["МК101"]);
        let dup = batch.cartridges[0].clone();
        batch.cartridges.push(dup);
        assert!(batch.validate().is_err());
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let batch = ServiceBatch::new_for_insert(
            "SB-1".into(),
            date(1),
            "X".into(),
            Some("   ".into()),
            vec![],
        );
        assert_eq!(batch.notes, None);
    }

    #[test]
    fn test_summary_splits_open_and_completed() {
        let mut done = batch_of(&["МК101"]);
        let ids = done.member_ids();
        done.record_receipt(&receipt(ids, 20));
        let batches = vec![batch_of(&["МК102"]), done];
        assert_eq!(
            BatchSummary::from_batches(&batches),
            BatchSummary {
                open: 1,
                completed: 1,
                total: 2
            }
        );
    }
}
