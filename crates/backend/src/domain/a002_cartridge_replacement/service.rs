use contracts::domain::a001_cartridge::{Cartridge, CartridgeStatusChange, StatusChangeSource};
use contracts::domain::a002_cartridge_replacement::{CartridgeReplacement, CartridgeReplacementDto};
use contracts::enums::{CartridgeStatus, CartridgeWorkflow};

use crate::domain::a001_cartridge;
use crate::domain::error::{LifecycleError, LifecycleResult};
use crate::shared::data::store::{CartridgeStore, ChangeSet};

fn ensure_eligible(cartridge: &Cartridge, workflow: CartridgeWorkflow) -> LifecycleResult<()> {
    if cartridge.status.is_eligible_for(workflow) {
        return Ok(());
    }
    let action = match workflow {
        CartridgeWorkflow::Install => "установлен",
        CartridgeWorkflow::Remove => "снят",
        CartridgeWorkflow::Dispatch => "отправлен в сервис",
    };
    Err(LifecycleError::InvalidState(format!(
        "Картридж {} в статусе \"{}\" не может быть {}",
        cartridge.number,
        cartridge.status.display_name(),
        action
    )))
}

/// Замена картриджа
///
/// Устанавливаемый картридж переходит в "working", снятый в "refill".
/// Обе смены статуса и запись журнала сохраняются одним набором изменений.
pub async fn record_replacement(
    store: &dyn CartridgeStore,
    dto: CartridgeReplacementDto,
) -> LifecycleResult<CartridgeReplacement> {
    let record = CartridgeReplacement::new_for_insert(&dto);
    record.validate().map_err(LifecycleError::Validation)?;

    let mut installed =
        a001_cartridge::service::find_by_number(store, &record.installed_cartridge_number).await?;
    ensure_eligible(&installed, CartridgeWorkflow::Install)?;

    let mut removed =
        a001_cartridge::service::find_by_number(store, &record.removed_cartridge_number).await?;
    ensure_eligible(&removed, CartridgeWorkflow::Remove)?;

    let mut changes = ChangeSet::new();
    for (cartridge, status) in [
        (&mut installed, CartridgeStatus::Working),
        (&mut removed, CartridgeStatus::Refill),
    ] {
        let previous = cartridge.change_status(status);
        changes.status_changes.push(CartridgeStatusChange::new(
            cartridge.base.id,
            previous,
            status,
            StatusChangeSource::Replacement,
        ));
    }
    changes.cartridges.push(installed);
    changes.cartridges.push(removed);
    changes.replacements.push(record);

    let mut committed = store.commit(changes).await?;
    let saved = committed
        .replacements
        .pop()
        .ok_or_else(|| anyhow::anyhow!("commit returned no replacement record"))?;

    tracing::info!(
        "Replacement in {}: installed {}, removed {} ({})",
        saved.department,
        saved.installed_cartridge_number,
        saved.removed_cartridge_number,
        saved.responsible
    );
    Ok(saved)
}

/// Журнал замен, новые записи первыми
pub async fn list_all(store: &dyn CartridgeStore) -> LifecycleResult<Vec<CartridgeReplacement>> {
    let mut items = store.list_replacements().await?;
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::memory_store::MemoryStore;
    use chrono::NaiveDate;
    use contracts::domain::a001_cartridge::CartridgeDto;

    async fn seed(store: &MemoryStore, number: &str, status: CartridgeStatus) -> Cartridge {
        let created = a001_cartridge::service::create(
            store,
            CartridgeDto {
                number: number.into(),
                model: "CE505A".into(),
                comment: None,
            },
        )
        .await
        .unwrap();
        if status == CartridgeStatus::Available {
            return created;
        }
        a001_cartridge::service::set_status(store, created.base.id, status)
            .await
            .unwrap()
    }

    fn form(installed: &str, removed: &str) -> CartridgeReplacementDto {
        CartridgeReplacementDto {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            department: "Бухгалтерия".into(),
            installed_cartridge_number: installed.into(),
            removed_cartridge_number: removed.into(),
            responsible: "Иванов И.И.".into(),
        }
    }

    #[tokio::test]
    async fn test_replacement_swaps_statuses_and_appends_record() {
        let store = MemoryStore::new();
        seed(&store, "МК101", CartridgeStatus::Available).await;
        seed(&store, "МК102", CartridgeStatus::Reserve).await;
        seed(&store, "МК103", CartridgeStatus::Working).await;

        let record = record_replacement(&store, form("МК101", "МК103"))
            .await
            .unwrap();
        assert_eq!(record.department, "Бухгалтерия");

        let all = a001_cartridge::service::list_all(&store).await.unwrap();
        assert_eq!(all.len(), 3);
        let status_of = |n: &str| all.iter().find(|c| c.number == n).unwrap().status;
        assert_eq!(status_of("МК101"), CartridgeStatus::Working);
        assert_eq!(status_of("МК103"), CartridgeStatus::Refill);
        // третий картридж не затронут
        assert_eq!(status_of("МК102"), CartridgeStatus::Reserve);

        let journal = list_all(&store).await.unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].installed_cartridge_number, "МК101");
    }

    #[tokio::test]
    async fn test_reserve_cartridge_can_be_installed() {
        let store = MemoryStore::new();
        let reserve = seed(&store, "МК104", CartridgeStatus::Reserve).await;
        seed(&store, "МК105", CartridgeStatus::Working).await;

        record_replacement(&store, form("МК104", "МК105")).await.unwrap();

        let history = a001_cartridge::service::status_history(&store, reserve.base.id)
            .await
            .unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.source, StatusChangeSource::Replacement);
        assert_eq!(last.to_status, CartridgeStatus::Working);
    }

    #[tokio::test]
    async fn test_ineligible_installed_cartridge_is_rejected_without_writes() {
        let store = MemoryStore::new();
        seed(&store, "МК101", CartridgeStatus::Refill).await;
        seed(&store, "МК103", CartridgeStatus::Working).await;

        let err = record_replacement(&store, form("МК101", "МК103"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState(_)));

        let removed = a001_cartridge::service::find_by_number(&store, "МК103")
            .await
            .unwrap();
        assert_eq!(removed.status, CartridgeStatus::Working);
        assert!(list_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_removed_cartridge_must_be_working() {
        let store = MemoryStore::new();
        seed(&store, "МК101", CartridgeStatus::Available).await;
        seed(&store, "МК102", CartridgeStatus::Available).await;

        let err = record_replacement(&store, form("МК101", "МК102"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_unknown_number_and_blank_fields() {
        let store = MemoryStore::new();
        seed(&store, "МК103", CartridgeStatus::Working).await;

        let err = record_replacement(&store, form("МК999", "МК103"))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));

        let mut blank = form("МК101", "МК103");
        blank.department = "  ".into();
        let err = record_replacement(&store, blank).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }
}
