use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Стабильные коды ошибок API
///
/// Клиенты сравнивают `code` из `{"code": "...", "message": "..."}`,
/// текст сообщения может меняться.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INVALID_STATE: &str = "INVALID_STATE";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const CONFLICT: &str = "CONFLICT";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Ошибки операций учета картриджей
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Картридж или партия не найдены
    #[error("{0}")]
    NotFound(String),

    /// Текущий статус не допускает операцию
    #[error("{0}")]
    InvalidState(String),

    /// Не заполнено обязательное поле или неверные данные формы
    #[error("{0}")]
    Validation(String),

    /// Запись изменена параллельным запросом
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

impl LifecycleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            LifecycleError::NotFound(_) => error_code::NOT_FOUND,
            LifecycleError::InvalidState(_) => error_code::INVALID_STATE,
            LifecycleError::Validation(_) => error_code::VALIDATION_FAILED,
            LifecycleError::Conflict(_) => error_code::CONFLICT,
            LifecycleError::Database(_)
            | LifecycleError::Serialization(_)
            | LifecycleError::Storage(_) => error_code::STORAGE_ERROR,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::InvalidState(_) => StatusCode::CONFLICT,
            LifecycleError::Validation(_) => StatusCode::BAD_REQUEST,
            LifecycleError::Conflict(_) => StatusCode::CONFLICT,
            LifecycleError::Database(_)
            | LifecycleError::Serialization(_)
            | LifecycleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Ошибка хранилища, а не пользовательского ввода
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<JsonRejection> for LifecycleError {
    fn from(rejection: JsonRejection) -> Self {
        LifecycleError::Validation(format!(
            "Некорректные данные запроса: {}",
            rejection.body_text()
        ))
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected ({}): {}", self.error_code(), self);
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            LifecycleError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LifecycleError::InvalidState("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LifecycleError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LifecycleError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LifecycleError::Storage(anyhow::anyhow!("disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(LifecycleError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(
            LifecycleError::InvalidState("x".into()).error_code(),
            "INVALID_STATE"
        );
        assert_eq!(
            LifecycleError::Validation("x".into()).error_code(),
            "VALIDATION_FAILED"
        );
        assert_eq!(LifecycleError::Conflict("x".into()).error_code(), "CONFLICT");
    }

    #[test]
    fn test_display_is_just_message() {
        assert_eq!(
            LifecycleError::NotFound("Картридж МК999 не найден".into()).to_string(),
            "Картридж МК999 не найден"
        );
    }

    #[test]
    fn test_response_carries_status() {
        let resp = LifecycleError::Validation("пусто".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
