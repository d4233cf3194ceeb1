use chrono::Utc;
use contracts::domain::a001_cartridge::{CartridgeId, CartridgeStatusChange, StatusChangeSource};
use contracts::domain::a003_service_batch::{
    BatchCartridge, BatchManifest, BatchSummary, CreateServiceBatchDto, ReceiveCartridgesDto,
    ServiceBatch, ServiceBatchId,
};
use contracts::enums::{BatchListFilter, CartridgeStatus, CartridgeWorkflow};

use crate::domain::a001_cartridge;
use crate::domain::error::{LifecycleError, LifecycleResult};
use crate::shared::data::store::{CartridgeStore, ChangeSet};

const BATCH_NUMBER_PREFIX: &str = "SB-";
const BATCH_NUMBER_SPACE: i64 = 1_000_000;

fn not_found(id: ServiceBatchId) -> LifecycleError {
    LifecycleError::NotFound(format!("Партия {} не найдена", id))
}

/// Номер партии по умолчанию: "SB-" и последние 6 цифр времени в мс
///
/// Если номер занят, берется следующий свободный.
pub async fn next_batch_number(store: &dyn CartridgeStore) -> LifecycleResult<String> {
    let mut n = Utc::now().timestamp_millis().rem_euclid(BATCH_NUMBER_SPACE);
    for _ in 0..BATCH_NUMBER_SPACE {
        let candidate = format!("{}{:06}", BATCH_NUMBER_PREFIX, n);
        if store.find_batch_by_number(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        n = (n + 1) % BATCH_NUMBER_SPACE;
    }
    Err(anyhow::anyhow!("no free batch number left").into())
}

/// Без повторов, в порядке выбора
fn distinct(ids: &[CartridgeId]) -> Vec<CartridgeId> {
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        if !result.contains(id) {
            result.push(*id);
        }
    }
    result
}

/// Отправка картриджей в сервис
///
/// Создает партию "in_progress" со снимком каждого картриджа,
/// сами картриджи переходят в "service".
pub async fn create_batch(
    store: &dyn CartridgeStore,
    dto: CreateServiceBatchDto,
) -> LifecycleResult<ServiceBatch> {
    let selected = if dto.select_all {
        a001_cartridge::service::list_eligible(store, CartridgeWorkflow::Dispatch)
            .await?
            .into_iter()
            .map(|c| c.base.id)
            .collect()
    } else {
        distinct(&dto.cartridge_ids)
    };
    if selected.is_empty() {
        return Err(LifecycleError::Validation(
            "Не выбраны картриджи для отправки".into(),
        ));
    }

    let mut cartridges = Vec::with_capacity(selected.len());
    for id in &selected {
        let cartridge = a001_cartridge::service::get_by_id(store, *id).await?;
        if !cartridge.status.is_eligible_for(CartridgeWorkflow::Dispatch) {
            return Err(LifecycleError::InvalidState(format!(
                "Картридж {} в статусе \"{}\" нельзя отправить в сервис",
                cartridge.number,
                cartridge.status.display_name()
            )));
        }
        cartridges.push(cartridge);
    }

    let batch_number = match dto
        .batch_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        Some(number) => {
            if store.find_batch_by_number(number).await?.is_some() {
                return Err(LifecycleError::Validation(format!(
                    "Партия с номером {} уже существует",
                    number
                )));
            }
            number.to_string()
        }
        None => next_batch_number(store).await?,
    };

    let members = cartridges.iter().map(BatchCartridge::dispatched).collect();
    let batch = ServiceBatch::new_for_insert(
        batch_number,
        dto.date,
        dto.responsible,
        dto.notes,
        members,
    );
    batch.validate().map_err(LifecycleError::Validation)?;

    let mut changes = ChangeSet::new();
    for mut cartridge in cartridges {
        let previous = cartridge.change_status(CartridgeStatus::Service);
        changes.status_changes.push(CartridgeStatusChange::new(
            cartridge.base.id,
            previous,
            CartridgeStatus::Service,
            StatusChangeSource::Dispatch,
        ));
        changes.cartridges.push(cartridge);
    }
    changes.batches.push(batch);

    let mut committed = store.commit(changes).await?;
    let saved = committed
        .batches
        .pop()
        .ok_or_else(|| anyhow::anyhow!("commit returned no batch"))?;

    tracing::info!(
        "Service batch {} created: {} cartridges, responsible {}",
        saved.batch_number,
        saved.cartridges.len(),
        saved.responsible
    );
    Ok(saved)
}

/// Прием картриджей из сервиса (полный или частичный)
pub async fn receive_cartridges(
    store: &dyn CartridgeStore,
    batch_id: ServiceBatchId,
    dto: ReceiveCartridgesDto,
) -> LifecycleResult<ServiceBatch> {
    let mut batch = get_by_id(store, batch_id).await?;
    if !batch.is_open() {
        return Err(LifecycleError::InvalidState(format!(
            "Партия {} уже выполнена",
            batch.batch_number
        )));
    }

    let selected = distinct(&dto.cartridge_ids);
    if selected.is_empty() {
        return Err(LifecycleError::Validation(
            "Не выбраны картриджи для приема".into(),
        ));
    }
    let responsible = dto.responsible.trim();
    if responsible.is_empty() {
        return Err(LifecycleError::Validation("Ответственный обязателен".into()));
    }

    for id in &selected {
        let member = batch.member(*id).ok_or_else(|| {
            LifecycleError::NotFound(format!(
                "Картридж {} не входит в партию {}",
                id, batch.batch_number
            ))
        })?;
        if !member.is_pending() {
            return Err(LifecycleError::InvalidState(format!(
                "Картридж {} уже принят из сервиса",
                member.number
            )));
        }
    }

    let mut changes = ChangeSet::new();
    for id in &selected {
        let mut cartridge = a001_cartridge::service::get_by_id(store, *id).await?;
        let previous = cartridge.change_status(CartridgeStatus::Available);
        cartridge.mark_returned(dto.return_date, responsible);
        changes.status_changes.push(CartridgeStatusChange::new(
            *id,
            previous,
            CartridgeStatus::Available,
            StatusChangeSource::Return,
        ));
        changes.cartridges.push(cartridge);
    }

    let receipt = ReceiveCartridgesDto {
        cartridge_ids: selected,
        ..dto
    };
    let status = batch.record_receipt(&receipt);
    changes.batches.push(batch);

    let mut committed = store.commit(changes).await?;
    let saved = committed
        .batches
        .pop()
        .ok_or_else(|| anyhow::anyhow!("commit returned no batch"))?;

    tracing::info!(
        "Service batch {}: received {} cartridges, {} remaining, status {}",
        saved.batch_number,
        receipt.cartridge_ids.len(),
        saved.remaining_count(),
        status
    );
    Ok(saved)
}

/// Список партий, новые первыми
pub async fn list(
    store: &dyn CartridgeStore,
    filter: Option<BatchListFilter>,
) -> LifecycleResult<Vec<ServiceBatch>> {
    let mut items: Vec<ServiceBatch> = store
        .list_batches()
        .await?
        .into_iter()
        .filter(|b| filter.map_or(true, |f| f.matches(b.status)))
        .collect();
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    Ok(items)
}

pub async fn get_by_id(
    store: &dyn CartridgeStore,
    id: ServiceBatchId,
) -> LifecycleResult<ServiceBatch> {
    store.get_batch(id).await?.ok_or_else(|| not_found(id))
}

/// Картриджи партии, которые еще в сервисе
pub async fn pending_cartridges(
    store: &dyn CartridgeStore,
    id: ServiceBatchId,
) -> LifecycleResult<Vec<BatchCartridge>> {
    let batch = get_by_id(store, id).await?;
    Ok(batch.pending_cartridges().into_iter().cloned().collect())
}

pub async fn summary(store: &dyn CartridgeStore) -> LifecycleResult<BatchSummary> {
    let items = store.list_batches().await?;
    Ok(BatchSummary::from_batches(&items))
}

/// Ведомость отправки для печати
pub async fn manifest(
    store: &dyn CartridgeStore,
    id: ServiceBatchId,
) -> LifecycleResult<BatchManifest> {
    let batch = get_by_id(store, id).await?;
    Ok(BatchManifest::from(&batch))
}
