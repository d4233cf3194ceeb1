use super::{AggregateId, EntityMetadata};

/// Корень агрегата: идентичность, версия и привязка к таблицам БД
pub trait AggregateRoot {
    type Id: AggregateId + std::fmt::Display;

    fn id(&self) -> Self::Id;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Индекс агрегата, например "a001"
    fn aggregate_index() -> &'static str;

    /// Имя коллекции, например "cartridge"
    fn collection_name() -> &'static str;

    /// Название для сообщений пользователю: "Картридж", "Партия"
    fn element_name() -> &'static str;

    /// Сохраненная версия (0 для еще не записанного агрегата)
    fn version(&self) -> i32 {
        self.metadata().version
    }

    fn is_new(&self) -> bool {
        self.metadata().is_new()
    }

    /// Основная таблица: "a001_cartridge"
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }

    /// Подчиненная таблица: "a001_cartridge_status_log"
    fn child_table(suffix: &str) -> String {
        format!("{}_{}", Self::full_name(), suffix)
    }
}
