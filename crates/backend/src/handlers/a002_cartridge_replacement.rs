use axum::{extract::State, http::StatusCode, Json};
use contracts::domain::a002_cartridge_replacement::{CartridgeReplacement, CartridgeReplacementDto};

use super::JsonBody;
use crate::domain::a002_cartridge_replacement;
use crate::domain::error::LifecycleResult;
use crate::system::app_state::AppState;

/// GET /api/cartridge_replacement
pub async fn list_all(
    State(state): State<AppState>,
) -> LifecycleResult<Json<Vec<CartridgeReplacement>>> {
    Ok(Json(
        a002_cartridge_replacement::service::list_all(state.store()).await?,
    ))
}

/// POST /api/cartridge_replacement
pub async fn create(
    State(state): State<AppState>,
    JsonBody(dto): JsonBody<CartridgeReplacementDto>,
) -> LifecycleResult<(StatusCode, Json<CartridgeReplacement>)> {
    let record = a002_cartridge_replacement::service::record_replacement(state.store(), dto).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
