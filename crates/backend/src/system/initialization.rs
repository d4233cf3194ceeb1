use chrono::Utc;
use contracts::domain::a001_cartridge::Cartridge;
use contracts::domain::a003_service_batch::CreateServiceBatchDto;
use contracts::enums::CartridgeStatus;
use serde::Serialize;

use crate::domain::a003_service_batch;
use crate::domain::error::LifecycleResult;
use crate::shared::data::store::{CartridgeStore, ChangeSet};

/// Демонстрационный реестр: номер, модель, начальный статус
const DEMO_CARTRIDGES: [(&str, &str, CartridgeStatus); 10] = [
    ("МК101", "CE505A", CartridgeStatus::Available),
    ("МК102", "CE505A", CartridgeStatus::Available),
    ("МК103", "CF280A", CartridgeStatus::Working),
    ("МК104", "CE505A", CartridgeStatus::Refill),
    ("МК105", "CF280A", CartridgeStatus::Reserve),
    ("МК106", "CE505A", CartridgeStatus::Working),
    ("МК107", "CB435A", CartridgeStatus::Refill),
    ("МК108", "CE505A", CartridgeStatus::Refill),
    ("МК109", "CF280A", CartridgeStatus::Refill),
    ("МК110", "CB435A", CartridgeStatus::Reserve),
];

/// Эти картриджи демо-партия отправляет в сервис
const DEMO_BATCH_MEMBERS: [&str; 2] = ["МК104", "МК109"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoDataReport {
    pub created: usize,
    pub skipped: usize,
    pub batch_number: Option<String>,
}

/// Заполнение демонстрационными данными
///
/// Уже существующие номера пропускаются. Демо-партия создается обычной
/// операцией отправки и только из картриджей, созданных этим вызовом.
pub async fn seed_demo_data(store: &dyn CartridgeStore) -> LifecycleResult<DemoDataReport> {
    let mut report = DemoDataReport::default();
    let mut changes = ChangeSet::new();

    for (number, model, status) in DEMO_CARTRIDGES {
        if store.find_cartridge_by_number(number).await?.is_some() {
            report.skipped += 1;
            continue;
        }
        changes.cartridges.push(Cartridge::new_with_status(
            number.to_string(),
            model.to_string(),
            None,
            status,
        ));
    }

    if changes.is_empty() {
        tracing::info!("Demo data already present, nothing to insert");
        return Ok(report);
    }

    let committed = store.commit(changes).await?;
    report.created = committed.cartridges.len();

    let members: Vec<_> = committed
        .cartridges
        .iter()
        .filter(|c| DEMO_BATCH_MEMBERS.contains(&c.number.as_str()))
        .map(|c| c.base.id)
        .collect();

    if !members.is_empty() {
        let batch = a003_service_batch::service::create_batch(
            store,
            CreateServiceBatchDto {
                batch_number: None,
                date: Utc::now().date_naive(),
                responsible: "Администратор".into(),
                notes: Some("Демонстрационная партия".into()),
                cartridge_ids: members,
                select_all: false,
            },
        )
        .await?;
        report.batch_number = Some(batch.batch_number);
    }

    tracing::info!(
        "Demo data: {} cartridges created, {} skipped",
        report.created,
        report.skipped
    );
    Ok(report)
}
