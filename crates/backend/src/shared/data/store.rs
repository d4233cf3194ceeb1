use async_trait::async_trait;
use contracts::domain::a001_cartridge::{Cartridge, CartridgeId, CartridgeStatusChange};
use contracts::domain::a002_cartridge_replacement::CartridgeReplacement;
use contracts::domain::a003_service_batch::{ServiceBatch, ServiceBatchId};
use contracts::domain::common::AggregateRoot;

use crate::domain::error::{LifecycleError, LifecycleResult};

/// Набор изменений одной операции
///
/// Хранилище применяет его целиком или не применяет вовсе.
/// Для картриджей и партий `metadata.version` содержит версию,
/// прочитанную из хранилища: 0 означает вставку, иначе обновление
/// с проверкой, что сохраненная версия не изменилась.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub cartridges: Vec<Cartridge>,
    pub batches: Vec<ServiceBatch>,
    pub replacements: Vec<CartridgeReplacement>,
    pub status_changes: Vec<CartridgeStatusChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cartridges.is_empty()
            && self.batches.is_empty()
            && self.replacements.is_empty()
            && self.status_changes.is_empty()
    }

    /// Количество записей (для логов)
    pub fn len(&self) -> usize {
        self.cartridges.len()
            + self.batches.len()
            + self.replacements.len()
            + self.status_changes.len()
    }
}

/// Версия, ожидаемая в хранилище
///
/// Увеличивает версию агрегата и обновляет timestamp.
pub(crate) fn advance_version<A: AggregateRoot>(aggregate: &mut A) -> i32 {
    let metadata = aggregate.metadata_mut();
    let expected = metadata.version;
    metadata.increment_version();
    metadata.touch();
    expected
}

pub(crate) fn version_conflict<A: AggregateRoot>(key: &str) -> LifecycleError {
    LifecycleError::Conflict(format!(
        "{} {}: запись изменена другим запросом, повторите операцию",
        A::element_name(),
        key
    ))
}

pub(crate) fn duplicate_key<A: AggregateRoot>(key: &str) -> LifecycleError {
    LifecycleError::Conflict(format!("{} {} уже существует", A::element_name(), key))
}

pub(crate) fn missing<A: AggregateRoot>(key: &str) -> LifecycleError {
    LifecycleError::NotFound(format!("{} {} не найдена в хранилище", A::element_name(), key))
}

/// Хранилище картриджей, замен и партий
///
/// Сервисы получают его через `AppState` и не зависят от способа хранения.
#[async_trait]
pub trait CartridgeStore: Send + Sync {
    async fn list_cartridges(&self) -> LifecycleResult<Vec<Cartridge>>;

    async fn get_cartridge(&self, id: CartridgeId) -> LifecycleResult<Option<Cartridge>>;

    async fn find_cartridge_by_number(&self, number: &str) -> LifecycleResult<Option<Cartridge>>;

    /// Журнал смены статусов картриджа, старые записи первыми
    async fn list_status_changes(
        &self,
        cartridge_id: CartridgeId,
    ) -> LifecycleResult<Vec<CartridgeStatusChange>>;

    async fn list_replacements(&self) -> LifecycleResult<Vec<CartridgeReplacement>>;

    async fn list_batches(&self) -> LifecycleResult<Vec<ServiceBatch>>;

    async fn get_batch(&self, id: ServiceBatchId) -> LifecycleResult<Option<ServiceBatch>>;

    async fn find_batch_by_number(&self, batch_number: &str)
        -> LifecycleResult<Option<ServiceBatch>>;

    /// Атомарно применить изменения
    ///
    /// Возвращает записанные агрегаты с новыми версиями. При конфликте
    /// версий или уникальных ключей возвращает `LifecycleError::Conflict`
    /// и ничего не меняет.
    async fn commit(&self, changes: ChangeSet) -> LifecycleResult<ChangeSet>;
}
