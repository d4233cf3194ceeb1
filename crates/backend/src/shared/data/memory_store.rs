use async_trait::async_trait;
use contracts::domain::a001_cartridge::{Cartridge, CartridgeId, CartridgeStatusChange};
use contracts::domain::a002_cartridge_replacement::CartridgeReplacement;
use contracts::domain::a003_service_batch::{ServiceBatch, ServiceBatchId};
use contracts::domain::common::AggregateRoot;
use tokio::sync::RwLock;

use super::store::{
    advance_version, duplicate_key, missing, version_conflict, CartridgeStore, ChangeSet,
};
use crate::domain::error::LifecycleResult;

#[derive(Debug, Default)]
struct MemoryState {
    cartridges: Vec<Cartridge>,
    batches: Vec<ServiceBatch>,
    replacements: Vec<CartridgeReplacement>,
    status_changes: Vec<CartridgeStatusChange>,
}

/// Хранилище в памяти процесса (тесты и демо-режим)
///
/// Весь `commit` выполняется под одной блокировкой записи.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_cartridge(state: &MemoryState, cartridge: &Cartridge) -> LifecycleResult<()> {
    let id = cartridge.base.id;
    let version = cartridge.version();
    if cartridge.is_new() {
        if state.cartridges.iter().any(|c| c.base.id == id) {
            return Err(version_conflict::<Cartridge>(&cartridge.number));
        }
        if state.cartridges.iter().any(|c| c.number == cartridge.number) {
            return Err(duplicate_key::<Cartridge>(&cartridge.number));
        }
        return Ok(());
    }
    match state.cartridges.iter().find(|c| c.base.id == id) {
        Some(stored) if stored.base.metadata.version == version => Ok(()),
        Some(_) => Err(version_conflict::<Cartridge>(&cartridge.number)),
        None => Err(missing::<Cartridge>(&cartridge.number)),
    }
}

fn check_batch(state: &MemoryState, batch: &ServiceBatch) -> LifecycleResult<()> {
    let id = batch.base.id;
    let version = batch.version();
    if batch.is_new() {
        if state
            .batches
            .iter()
            .any(|b| b.base.id == id || b.batch_number == batch.batch_number)
        {
            return Err(duplicate_key::<ServiceBatch>(&batch.batch_number));
        }
        return Ok(());
    }
    match state.batches.iter().find(|b| b.base.id == id) {
        Some(stored) if stored.base.metadata.version == version => Ok(()),
        Some(_) => Err(version_conflict::<ServiceBatch>(&batch.batch_number)),
        None => Err(missing::<ServiceBatch>(&batch.batch_number)),
    }
}

#[async_trait]
impl CartridgeStore for MemoryStore {
    async fn list_cartridges(&self) -> LifecycleResult<Vec<Cartridge>> {
        Ok(self.state.read().await.cartridges.clone())
    }

    async fn get_cartridge(&self, id: CartridgeId) -> LifecycleResult<Option<Cartridge>> {
        let state = self.state.read().await;
        Ok(state.cartridges.iter().find(|c| c.base.id == id).cloned())
    }

    async fn find_cartridge_by_number(&self, number: &str) -> LifecycleResult<Option<Cartridge>> {
        let state = self.state.read().await;
        Ok(state.cartridges.iter().find(|c| c.number == number).cloned())
    }

    async fn list_status_changes(
        &self,
        cartridge_id: CartridgeId,
    ) -> LifecycleResult<Vec<CartridgeStatusChange>> {
        let state = self.state.read().await;
        Ok(state
            .status_changes
            .iter()
            .filter(|s| s.cartridge_id == cartridge_id)
            .cloned()
            .collect())
    }

    async fn list_replacements(&self) -> LifecycleResult<Vec<CartridgeReplacement>> {
        Ok(self.state.read().await.replacements.clone())
    }

    async fn list_batches(&self) -> LifecycleResult<Vec<ServiceBatch>> {
        Ok(self.state.read().await.batches.clone())
    }

    async fn get_batch(&self, id: ServiceBatchId) -> LifecycleResult<Option<ServiceBatch>> {
        let state = self.state.read().await;
        Ok(state.batches.iter().find(|b| b.base.id == id).cloned())
    }

    async fn find_batch_by_number(
        &self,
        batch_number: &str,
    ) -> LifecycleResult<Option<ServiceBatch>> {
        let state = self.state.read().await;
        Ok(state
            .batches
            .iter()
            .find(|b| b.batch_number == batch_number)
            .cloned())
    }

    async fn commit(&self, mut changes: ChangeSet) -> LifecycleResult<ChangeSet> {
        let mut state = self.state.write().await;

        // Сначала проверяем все записи, потом применяем
        for cartridge in &changes.cartridges {
            check_cartridge(&state, cartridge)?;
        }
        for batch in &changes.batches {
            check_batch(&state, batch)?;
        }

        for cartridge in &mut changes.cartridges {
            let expected = advance_version(cartridge);
            if expected == 0 {
                state.cartridges.push(cartridge.clone());
            } else if let Some(stored) = state
                .cartridges
                .iter_mut()
                .find(|c| c.base.id == cartridge.base.id)
            {
                *stored = cartridge.clone();
            }
        }

        for batch in &mut changes.batches {
            let expected = advance_version(batch);
            if expected == 0 {
                state.batches.push(batch.clone());
            } else if let Some(stored) = state
                .batches
                .iter_mut()
                .find(|b| b.base.id == batch.base.id)
            {
                *stored = batch.clone();
            }
        }

        for replacement in &mut changes.replacements {
            advance_version(replacement);
            state.replacements.push(replacement.clone());
        }

        state
            .status_changes
            .extend(changes.status_changes.iter().cloned());

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::LifecycleError;
    use contracts::enums::CartridgeStatus;

    fn cartridge(number: &str) -> Cartridge {
        Cartridge::new_for_insert(number.into(), "CE505A".into(), None)
    }

    #[tokio::test]
    async fn test_commit_inserts_with_version_one() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        changes.cartridges.push(cartridge("МК101"));
        let committed = store.commit(changes).await.unwrap();

        assert_eq!(committed.cartridges[0].base.metadata.version, 1);
        let stored = store.find_cartridge_by_number("МК101").await.unwrap().unwrap();
        assert_eq!(stored.base.metadata.version, 1);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_atomically() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        changes.cartridges.push(cartridge("МК101"));
        changes.cartridges.push(cartridge("МК102"));
        let committed = store.commit(changes).await.unwrap();

        // два читателя получили одну и ту же версию
        let mut first = committed.cartridges[0].clone();
        let mut second = committed.cartridges[0].clone();
        first.change_status(CartridgeStatus::Working);
        second.change_status(CartridgeStatus::Refill);

        let mut ok = ChangeSet::new();
        ok.cartridges.push(first);
        store.commit(ok).await.unwrap();

        let mut other = committed.cartridges[1].clone();
        other.change_status(CartridgeStatus::Reserve);
        let mut stale = ChangeSet::new();
        stale.cartridges.push(other);
        stale.cartridges.push(second);
        let err = store.commit(stale).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));

        // вторая запись того же набора не применилась
        let untouched = store.find_cartridge_by_number("МК102").await.unwrap().unwrap();
        assert_eq!(untouched.status, CartridgeStatus::Available);
        let winner = store.find_cartridge_by_number("МК101").await.unwrap().unwrap();
        assert_eq!(winner.status, CartridgeStatus::Working);
        assert_eq!(winner.base.metadata.version, 2);
    }

    #[tokio::test]
    async fn test_duplicate_number_is_conflict() {
        let store = MemoryStore::new();
        let mut changes = ChangeSet::new();
        changes.cartridges.push(cartridge("МК101"));
        store.commit(changes).await.unwrap();

        let mut dup = ChangeSet::new();
        dup.cartridges.push(cartridge("МК101"));
        let err = store.commit(dup).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Conflict(_)));
        assert_eq!(store.list_cartridges().await.unwrap().len(), 1);
    }
}
