use contracts::domain::a001_cartridge::{
    Cartridge, CartridgeDto, CartridgeId, CartridgeStatusChange, StatusChangeSource, StatusSummary,
};
use contracts::enums::{CartridgeStatus, CartridgeWorkflow};

use crate::domain::error::{LifecycleError, LifecycleResult};
use crate::shared::data::store::{CartridgeStore, ChangeSet};
use crate::shared::format::format_optional_date;

/// Порядок отображения реестра: по номеру без учета регистра
pub fn sort_by_number(cartridges: &mut [Cartridge]) {
    cartridges.sort_by(|a, b| {
        a.number
            .to_lowercase()
            .cmp(&b.number.to_lowercase())
            .then_with(|| a.number.cmp(&b.number))
    });
}

pub(crate) fn not_found(id: CartridgeId) -> LifecycleError {
    LifecycleError::NotFound(format!("Картридж {} не найден", id))
}

/// Получение списка всех картриджей
pub async fn list_all(store: &dyn CartridgeStore) -> LifecycleResult<Vec<Cartridge>> {
    let mut items = store.list_cartridges().await?;
    sort_by_number(&mut items);
    Ok(items)
}

/// Список с поиском по номеру/модели и фильтром по статусу
pub async fn list_filtered(
    store: &dyn CartridgeStore,
    search: Option<&str>,
    status: Option<CartridgeStatus>,
) -> LifecycleResult<Vec<Cartridge>> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let items = list_all(store)
        .await?
        .into_iter()
        .filter(|c| status.map_or(true, |s| c.status == s))
        .filter(|c| search.map_or(true, |term| c.matches_search(term)))
        .collect();
    Ok(items)
}

/// Картриджи, которые можно выбрать для операции
pub async fn list_eligible(
    store: &dyn CartridgeStore,
    workflow: CartridgeWorkflow,
) -> LifecycleResult<Vec<Cartridge>> {
    let items = list_all(store)
        .await?
        .into_iter()
        .filter(|c| c.status.is_eligible_for(workflow))
        .collect();
    Ok(items)
}

pub async fn get_by_id(store: &dyn CartridgeStore, id: CartridgeId) -> LifecycleResult<Cartridge> {
    store.get_cartridge(id).await?.ok_or_else(|| not_found(id))
}

/// Поиск по инвентарному номеру (пробелы по краям игнорируются)
pub async fn find_by_number(store: &dyn CartridgeStore, number: &str) -> LifecycleResult<Cartridge> {
    let number = number.trim();
    store
        .find_cartridge_by_number(number)
        .await?
        .ok_or_else(|| LifecycleError::NotFound(format!("Картридж {} не найден", number)))
}

/// Создание нового картриджа в статусе "available"
pub async fn create(store: &dyn CartridgeStore, dto: CartridgeDto) -> LifecycleResult<Cartridge> {
    let aggregate = Cartridge::new_for_insert(dto.number, dto.model, dto.comment);

    aggregate.validate().map_err(LifecycleError::Validation)?;

    if store
        .find_cartridge_by_number(&aggregate.number)
        .await?
        .is_some()
    {
        return Err(LifecycleError::Validation(format!(
            "Картридж с номером {} уже существует",
            aggregate.number
        )));
    }

    let mut changes = ChangeSet::new();
    changes.cartridges.push(aggregate);
    let mut committed = store.commit(changes).await?;
    let created = committed
        .cartridges
        .pop()
        .ok_or_else(|| anyhow::anyhow!("commit returned no cartridge"))?;

    tracing::info!(
        "Cartridge {} ({}) created",
        created.number,
        created.model
    );
    Ok(created)
}

/// Ручная смена статуса без проверки перехода
///
/// Повторная установка текущего статуса ничего не записывает.
pub async fn set_status(
    store: &dyn CartridgeStore,
    id: CartridgeId,
    status: CartridgeStatus,
) -> LifecycleResult<Cartridge> {
    let mut cartridge = get_by_id(store, id).await?;
    if cartridge.status == status {
        return Ok(cartridge);
    }

    let previous = cartridge.change_status(status);
    let mut changes = ChangeSet::new();
    changes.status_changes.push(CartridgeStatusChange::new(
        id,
        previous,
        status,
        StatusChangeSource::Manual,
    ));
    changes.cartridges.push(cartridge);

    let mut committed = store.commit(changes).await?;
    let updated = committed
        .cartridges
        .pop()
        .ok_or_else(|| anyhow::anyhow!("commit returned no cartridge"))?;

    tracing::info!(
        "Cartridge {} status changed manually: {} -> {}",
        updated.number,
        previous,
        status
    );
    Ok(updated)
}

/// Журнал смены статусов, старые записи первыми
pub async fn status_history(
    store: &dyn CartridgeStore,
    id: CartridgeId,
) -> LifecycleResult<Vec<CartridgeStatusChange>> {
    get_by_id(store, id).await?;
    let mut history = store.list_status_changes(id).await?;
    history.sort_by_key(|h| h.changed_at);
    Ok(history)
}

pub async fn status_summary(store: &dyn CartridgeStore) -> LifecycleResult<StatusSummary> {
    let items = store.list_cartridges().await?;
    Ok(StatusSummary::from_cartridges(&items))
}

/// Выгрузка реестра в CSV
pub async fn export_csv(store: &dyn CartridgeStore) -> LifecycleResult<String> {
    let items = list_all(store).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Номер",
            "Модель",
            "Статус",
            "Дата возврата",
            "Ответственный",
        ])
        .map_err(anyhow::Error::from)?;
    for c in &items {
        let return_date = format_optional_date(c.return_date);
        writer
            .write_record([
                c.number.as_str(),
                c.model.as_str(),
                c.status.display_name(),
                return_date.as_str(),
                c.return_responsible.as_deref().unwrap_or(""),
            ])
            .map_err(anyhow::Error::from)?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    let text = String::from_utf8(bytes).map_err(anyhow::Error::from)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::memory_store::MemoryStore;

    fn dto(number: &str, model: &str) -> CartridgeDto {
        CartridgeDto {
            number: number.into(),
            model: model.into(),
            comment: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_available_and_rejects_blank_fields() {
        let store = MemoryStore::new();
        let created = create(&store, dto("  МК101 ", "CE505A")).await.unwrap();
        assert_eq!(created.number, "МК101");
        assert_eq!(created.status, CartridgeStatus::Available);

        let err = create(&store, dto("   ", "CE505A")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        let err = create(&store, dto("МК102", "")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(list_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_validation_error() {
        let store = MemoryStore::new();
        create(&store, dto("МК101", "CE505A")).await.unwrap();
        let err = create(&store, dto("МК101", "CF280A")).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_is_sorted_case_insensitively() {
        let store = MemoryStore::new();
        for n in ["мк103", "МК101", "AB-1", "МК102"] {
            create(&store, dto(n, "CE505A")).await.unwrap();
        }
        let numbers: Vec<String> = list_all(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.number)
            .collect();
        assert_eq!(numbers, vec!["AB-1", "МК101", "МК102", "мк103"]);
    }

    #[tokio::test]
    async fn test_find_by_number_trims_and_reports_not_found() {
        let store = MemoryStore::new();
        let created = create(&store, dto("МК101", "CE505A")).await.unwrap();
        let found = find_by_number(&store, "  МК101  ").await.unwrap();
        assert_eq!(found.base.id, created.base.id);

        let err = find_by_number(&store, "МК999").await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
        let err = get_by_id(&store, CartridgeId::new_v4()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_status_is_permissive_and_audited() {
        let store = MemoryStore::new();
        let created = create(&store, dto("МК101", "CE505A")).await.unwrap();
        let id = created.base.id;

        // любой переход разрешен, в том числе available -> service
        let updated = set_status(&store, id, CartridgeStatus::Service).await.unwrap();
        assert_eq!(updated.status, CartridgeStatus::Service);
        set_status(&store, id, CartridgeStatus::Working).await.unwrap();

        // повтор текущего статуса не пишет журнал
        set_status(&store, id, CartridgeStatus::Working).await.unwrap();

        let history = status_history(&store, id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_status, CartridgeStatus::Available);
        assert_eq!(history[0].to_status, CartridgeStatus::Service);
        assert_eq!(history[1].to_status, CartridgeStatus::Working);
        assert!(history
            .iter()
            .all(|h| h.source == StatusChangeSource::Manual));
    }

    #[tokio::test]
    async fn test_filters_summary_and_eligibility() {
        let store = MemoryStore::new();
        let a = create(&store, dto("МК101", "CE505A")).await.unwrap();
        let b = create(&store, dto("МК102", "CF280A")).await.unwrap();
        create(&store, dto("МК103", "CE505A")).await.unwrap();
        set_status(&store, a.base.id, CartridgeStatus::Working).await.unwrap();
        set_status(&store, b.base.id, CartridgeStatus::Refill).await.unwrap();

        let by_model = list_filtered(&store, Some("cf280"), None).await.unwrap();
        assert_eq!(by_model.len(), 1);
        assert_eq!(by_model[0].number, "МК102");

        let working = list_filtered(&store, Some("мк"), Some(CartridgeStatus::Working))
            .await
            .unwrap();
        assert_eq!(working.len(), 1);
        assert_eq!(working[0].number, "МК101");

        let summary = status_summary(&store).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(CartridgeStatus::Available), 1);
        assert_eq!(summary.count(CartridgeStatus::Refill), 1);
        assert_eq!(summary.count(CartridgeStatus::Service), 0);

        let install = list_eligible(&store, CartridgeWorkflow::Install).await.unwrap();
        assert_eq!(install.len(), 1);
        let dispatch = list_eligible(&store, CartridgeWorkflow::Dispatch).await.unwrap();
        assert_eq!(dispatch[0].number, "МК102");
    }

    #[tokio::test]
    async fn test_export_csv_has_header_and_labels() {
        let store = MemoryStore::new();
        create(&store, dto("МК101", "CE505A")).await.unwrap();
        let csv = export_csv(&store).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Номер,Модель,Статус,Дата возврата,Ответственный");
        assert_eq!(lines[1], "МК101,CE505A,Готовы к использованию,,");
    }
}
