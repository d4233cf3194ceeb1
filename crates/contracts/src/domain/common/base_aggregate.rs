use super::EntityMetadata;
use serde::{Deserialize, Serialize};

/// Общая часть всех агрегатов: id, комментарий и метаданные
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseAggregate<Id> {
    pub id: Id,
    pub comment: Option<String>,
    pub metadata: EntityMetadata,
}

impl<Id> BaseAggregate<Id> {
    /// Новый несохраненный агрегат (version = 0)
    pub fn new(id: Id) -> Self {
        Self {
            id,
            comment: None,
            metadata: EntityMetadata::new(),
        }
    }

    /// Восстановление из строки БД
    pub fn restore(id: Id, comment: Option<String>, metadata: EntityMetadata) -> Self {
        Self {
            id,
            comment,
            metadata,
        }
    }

    pub fn touch(&mut self) {
        self.metadata.touch();
    }

    /// Комментарий без пробелов по краям; пустая строка означает его отсутствие
    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_comment_drops_blank_text() {
        let mut base = BaseAggregate::new(1u8);
        base.set_comment(Some("  склад 2 ".into()));
        assert_eq!(base.comment.as_deref(), Some("склад 2"));
        base.set_comment(Some("   ".into()));
        assert_eq!(base.comment, None);
    }
}
