use super::aggregate::ServiceBatch;
use crate::enums::CartridgeStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Строка ведомости отправки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRow {
    /// Порядковый номер, с 1
    pub index: usize,
    pub number: String,
    pub model: String,
    pub prior_status: CartridgeStatus,
    pub prior_status_label: String,
}

/// Ведомость отправки картриджей в сервис (только для печати)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchManifest {
    pub batch_number: String,
    pub date: NaiveDate,
    pub responsible: String,
    pub notes: Option<String>,
    pub rows: Vec<ManifestRow>,
    pub total: usize,
}

impl From<&ServiceBatch> for BatchManifest {
    fn from(batch: &ServiceBatch) -> Self {
        let rows = batch
            .cartridges
            .iter()
            .enumerate()
            .map(|(i, c)| ManifestRow {
                index: i + 1,
                number: c.number.clone(),
                model: c.model.clone(),
                prior_status: c.prior_status,
                prior_status_label: c.prior_status.display_name().to_string(),
            })
            .collect();

        Self {
            batch_number: batch.batch_number.clone(),
            date: batch.date,
            responsible: batch.responsible.clone(),
            notes: batch.notes.clone(),
            rows,
            total: batch.cartridges.len(),
        }
    }
}
