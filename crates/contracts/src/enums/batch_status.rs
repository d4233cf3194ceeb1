use serde::{Deserialize, Serialize};

/// Статус партии, отправленной в сервис
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    PartialReturn,
    Completed,
}

impl BatchStatus {
    pub fn code(&self) -> &'static str {
        match self {
            BatchStatus::InProgress => "in_progress",
            BatchStatus::PartialReturn => "partial_return",
            BatchStatus::Completed => "completed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BatchStatus::InProgress => "В стадии заправки",
            BatchStatus::PartialReturn => "Частичный возврат",
            BatchStatus::Completed => "Выполнено",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "in_progress" => Some(BatchStatus::InProgress),
            "partial_return" => Some(BatchStatus::PartialReturn),
            "completed" => Some(BatchStatus::Completed),
            _ => None,
        }
    }

    /// Партия еще ждет возврата картриджей
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Из этого статуса переходов нет
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Фильтр списка партий
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchListFilter {
    /// В работе: in_progress и partial_return
    Open,
    Completed,
}

impl BatchListFilter {
    pub fn matches(&self, status: BatchStatus) -> bool {
        match self {
            BatchListFilter::Open => status.is_open(),
            BatchListFilter::Completed => status.is_terminal(),
        }
    }
}
