use async_trait::async_trait;
use contracts::domain::a001_cartridge::{Cartridge, CartridgeId, CartridgeStatusChange};
use contracts::domain::a002_cartridge_replacement::CartridgeReplacement;
use contracts::domain::a003_service_batch::{ServiceBatch, ServiceBatchId};
use contracts::domain::common::AggregateRoot;
use sea_orm::{DatabaseConnection, DatabaseTransaction, SqlErr, TransactionTrait};

use super::store::{
    advance_version, duplicate_key, missing, version_conflict, CartridgeStore, ChangeSet,
};
use crate::domain::a001_cartridge::{repository as cartridge_repo, status_log};
use crate::domain::a002_cartridge_replacement::repository as replacement_repo;
use crate::domain::a003_service_batch::repository as batch_repo;
use crate::domain::error::{LifecycleError, LifecycleResult};

/// Уникальный индекс сработал при вставке: ключ занял параллельный запрос
fn unique_violation<A: AggregateRoot>(err: LifecycleError, key: &str) -> LifecycleError {
    match err {
        LifecycleError::Database(db_err)
            if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            duplicate_key::<A>(key)
        }
        other => other,
    }
}

/// Хранилище в SQLite через SeaORM
///
/// `commit` выполняется в одной транзакции, все чтения внутри
/// транзакции идут через нее же.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn write_cartridge(
        txn: &DatabaseTransaction,
        cartridge: &mut Cartridge,
    ) -> LifecycleResult<()> {
        let expected = advance_version(cartridge);
        if expected == 0 {
            if cartridge_repo::exists_by_number(txn, &cartridge.number).await? {
                return Err(duplicate_key::<Cartridge>(&cartridge.number));
            }
            cartridge_repo::insert(txn, cartridge)
                .await
                .map_err(|e| unique_violation::<Cartridge>(e.into(), &cartridge.number))?;
            return Ok(());
        }

        if !cartridge_repo::update_versioned(txn, cartridge, expected).await? {
            return match cartridge_repo::get_by_id(txn, cartridge.base.id).await? {
                Some(_) => Err(version_conflict::<Cartridge>(&cartridge.number)),
                None => Err(missing::<Cartridge>(&cartridge.number)),
            };
        }
        Ok(())
    }

    async fn write_batch(txn: &DatabaseTransaction, batch: &mut ServiceBatch) -> LifecycleResult<()> {
        let expected = advance_version(batch);
        if expected == 0 {
            if batch_repo::exists_by_batch_number(txn, &batch.batch_number).await? {
                return Err(duplicate_key::<ServiceBatch>(&batch.batch_number));
            }
            batch_repo::insert(txn, batch)
                .await
                .map_err(|e| unique_violation::<ServiceBatch>(e, &batch.batch_number))?;
            return Ok(());
        }

        if !batch_repo::update_versioned(txn, batch, expected).await? {
            return match batch_repo::get_by_id(txn, batch.base.id).await? {
                Some(_) => Err(version_conflict::<ServiceBatch>(&batch.batch_number)),
                None => Err(missing::<ServiceBatch>(&batch.batch_number)),
            };
        }
        Ok(())
    }

    async fn apply(txn: &DatabaseTransaction, changes: &mut ChangeSet) -> LifecycleResult<()> {
        for cartridge in &mut changes.cartridges {
            Self::write_cartridge(txn, cartridge).await?;
        }
        for batch in &mut changes.batches {
            Self::write_batch(txn, batch).await?;
        }
        for replacement in &mut changes.replacements {
            advance_version(replacement);
            replacement_repo::insert(txn, replacement).await?;
        }
        for change in &changes.status_changes {
            status_log::insert(txn, change).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CartridgeStore for SeaOrmStore {
    async fn list_cartridges(&self) -> LifecycleResult<Vec<Cartridge>> {
        cartridge_repo::list_all(&self.db).await
    }

    async fn get_cartridge(&self, id: CartridgeId) -> LifecycleResult<Option<Cartridge>> {
        cartridge_repo::get_by_id(&self.db, id).await
    }

    async fn find_cartridge_by_number(&self, number: &str) -> LifecycleResult<Option<Cartridge>> {
        cartridge_repo::get_by_number(&self.db, number).await
    }

    async fn list_status_changes(
        &self,
        cartridge_id: CartridgeId,
    ) -> LifecycleResult<Vec<CartridgeStatusChange>> {
        status_log::list_by_cartridge(&self.db, cartridge_id).await
    }

    async fn list_replacements(&self) -> LifecycleResult<Vec<CartridgeReplacement>> {
        replacement_repo::list_all(&self.db).await
    }

    async fn list_batches(&self) -> LifecycleResult<Vec<ServiceBatch>> {
        batch_repo::list_all(&self.db).await
    }

    async fn get_batch(&self, id: ServiceBatchId) -> LifecycleResult<Option<ServiceBatch>> {
        batch_repo::get_by_id(&self.db, id).await
    }

    async fn find_batch_by_number(
        &self,
        batch_number: &str,
    ) -> LifecycleResult<Option<ServiceBatch>> {
        batch_repo::get_by_batch_number(&self.db, batch_number).await
    }

    async fn commit(&self, mut changes: ChangeSet) -> LifecycleResult<ChangeSet> {
        let txn = self.db.begin().await?;
        match Self::apply(&txn, &mut changes).await {
            Ok(()) => {
                txn.commit().await?;
                tracing::debug!("Committed {} records", changes.len());
                Ok(changes)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use chrono::NaiveDate;
    use contracts::domain::a001_cartridge::StatusChangeSource;
    use contracts::domain::a002_cartridge_replacement::CartridgeReplacementDto;
    use contracts::domain::a003_service_batch::{BatchCartridge, ReceiveCartridgesDto};
    use contracts::enums::{BatchStatus, CartridgeStatus};

    async fn store() -> SeaOrmStore {
        SeaOrmStore::new(connect_in_memory().await.unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_cartridge_round_trip_and_versioned_update() {
        let store = store().await;
        let mut changes = ChangeSet::new();
        changes.cartridges.push(Cartridge::new_for_insert(
            "МК101".into(),
            "CE505A".into(),
            Some("склад".into()),
        ));
        let committed = store.commit(changes).await.unwrap();
        let id = committed.cartridges[0].base.id;

        let mut loaded = store.get_cartridge(id).await.unwrap().unwrap();
        assert_eq!(loaded.number, "МК101");
        assert_eq!(loaded.base.comment.as_deref(), Some("склад"));
        assert_eq!(loaded.base.metadata.version, 1);

        let previous = loaded.change_status(CartridgeStatus::Working);
        let mut update = ChangeSet::new();
        update.status_changes.push(CartridgeStatusChange::new(
            id,
            previous,
            CartridgeStatus::Working,
            StatusChangeSource::Manual,
        ));
        update.cartridges.push(loaded);
        store.commit(update).await.unwrap();

        let reloaded = store.find_cartridge_by_number("МК101").await.unwrap().unwrap();
        assert_eq!(reloaded.status, CartridgeStatus::Working);
        assert_eq!(reloaded.base.metadata.version, 2);

        let history = store.list_status_changes(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].to_status, CartridgeStatus::Working);
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_whole_change_set() {
        let store = store().await;
        let mut changes = ChangeSet::new();
        changes
            .cartridges
            .push(Cartridge::new_for_insert("МК101".into(), "CE505A".into(), None));
        let committed = store.commit(changes).await.unwrap();

        let mut stale = committed.cartridges[0].clone();
        stale.base.metadata.version = 7;
        stale.change_status(CartridgeStatus::Refill);

        let mut bad = ChangeSet::new();
        bad.replacements
            .push(CartridgeReplacement::new_for_insert(&CartridgeReplacementDto {
                date: date(1),
                department: "Бухгалтерия".into(),
                installed_cartridge_number: "МК102".into(),
                removed_cartridge_number: "МК101".into(),
                responsible: "Иванов И.И.".into(),
            }));
        bad.cartridges.push(stale);

        let err = store.commit(bad).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));
        assert!(store.list_replacements().await.unwrap().is_empty());
        let current = store.find_cartridge_by_number("МК101").await.unwrap().unwrap();
        assert_eq!(current.status, CartridgeStatus::Available);
    }

    #[tokio::test]
    async fn test_batch_json_columns_survive_reload() {
        let store = store().await;
        let cartridge =
            Cartridge::new_with_status("МК105".into(), "CE505A".into(), None, CartridgeStatus::Refill);
        let batch = ServiceBatch::new_for_insert(
            "SB-000001".into(),
            date(10),
            "Петров П.П.".into(),
            None,
            vec![BatchCartridge::dispatched(&cartridge)],
        );
        let mut changes = ChangeSet::new();
        changes.batches.push(batch);
        let committed = store.commit(changes).await.unwrap();

        let mut loaded = store
            .get_batch(committed.batches[0].base.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.cartridges[0].prior_status, CartridgeStatus::Refill);

        loaded.record_receipt(&ReceiveCartridgesDto {
            return_date: date(12),
            responsible: "Петров П.П.".into(),
            notes: None,
            cartridge_ids: vec![cartridge.base.id],
        });
        let mut update = ChangeSet::new();
        update.batches.push(loaded);
        store.commit(update).await.unwrap();

        let reloaded = store.find_batch_by_number("SB-000001").await.unwrap().unwrap();
        assert_eq!(reloaded.status, BatchStatus::Completed);
        assert_eq!(reloaded.returned_cartridges, vec![cartridge.base.id]);
        assert_eq!(reloaded.cartridge_returns[0].return_date, date(12));
    }

    #[tokio::test]
    async fn test_duplicate_batch_number_is_conflict() {
        let store = store().await;
        let cartridge = Cartridge::new_for_insert("МК101".into(), "CE505A".into(), None);
        for expect_ok in [true, false] {
            let mut changes = ChangeSet::new();
            changes.batches.push(ServiceBatch::new_for_insert(
                "SB-000002".into(),
                date(5),
                "Иванов И.И.".into(),
                None,
                vec![BatchCartridge::dispatched(&cartridge)],
            ));
            let result = store.commit(changes).await;
            assert_eq!(result.is_ok(), expect_ok);
        }
    }

    #[tokio::test]
    async fn test_unique_index_violation_is_conflict() {
        let store = store().await;
        let first = Cartridge::new_for_insert("МК101".into(), "CE505A".into(), None);
        let racing = Cartridge::new_for_insert("МК101".into(), "CF280A".into(), None);
        cartridge_repo::insert(&store.db, &first).await.unwrap();

        // вставка в обход проверки номера, как при гонке двух запросов
        let err = cartridge_repo::insert(&store.db, &racing).await.unwrap_err();
        let mapped = unique_violation::<Cartridge>(err.into(), &racing.number);
        assert!(matches!(mapped, LifecycleError::Conflict(_)));

        let other = unique_violation::<Cartridge>(LifecycleError::Validation("x".into()), "МК101");
        assert!(matches!(other, LifecycleError::Validation(_)));
    }
}
