pub mod a001_cartridge;
pub mod a002_cartridge_replacement;
pub mod a003_service_batch;

use axum::extract::FromRequest;
use contracts::domain::common::AggregateId;

use crate::domain::error::LifecycleError;

/// Разбор идентификатора из пути запроса
pub(crate) fn parse_id<T: AggregateId>(id: &str) -> Result<T, LifecycleError> {
    T::from_string(id)
        .map_err(|_| LifecycleError::Validation(format!("Некорректный идентификатор: {}", id)))
}

/// JSON-тело запроса; ошибки разбора отдаются как `VALIDATION_FAILED`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(LifecycleError))]
pub struct JsonBody<T>(pub T);
