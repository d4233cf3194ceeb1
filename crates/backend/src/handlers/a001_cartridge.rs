use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use contracts::domain::a001_cartridge::{
    Cartridge, CartridgeDto, CartridgeId, CartridgeStatusChange, SetStatusDto, StatusSummary,
};
use contracts::enums::{CartridgeStatus, CartridgeWorkflow};
use serde::Deserialize;

use super::{parse_id, JsonBody};
use crate::domain::a001_cartridge;
use crate::domain::error::{LifecycleError, LifecycleResult};
use crate::system::app_state::AppState;
use crate::system::initialization::{self, DemoDataReport};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

/// GET /api/cartridge
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> LifecycleResult<Json<Vec<Cartridge>>> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(code) => Some(CartridgeStatus::from_code(code).ok_or_else(|| {
            LifecycleError::Validation(format!("Неизвестный статус: {}", code))
        })?),
        None => None,
    };
    let items =
        a001_cartridge::service::list_filtered(state.store(), query.search.as_deref(), status)
            .await?;
    Ok(Json(items))
}

/// POST /api/cartridge
pub async fn create(
    State(state): State<AppState>,
    JsonBody(dto): JsonBody<CartridgeDto>,
) -> LifecycleResult<(StatusCode, Json<Cartridge>)> {
    let created = a001_cartridge::service::create(state.store(), dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/cartridge/summary
pub async fn summary(State(state): State<AppState>) -> LifecycleResult<Json<StatusSummary>> {
    Ok(Json(
        a001_cartridge::service::status_summary(state.store()).await?,
    ))
}

/// GET /api/cartridge/export
pub async fn export_csv(State(state): State<AppState>) -> LifecycleResult<impl IntoResponse> {
    let body = a001_cartridge::service::export_csv(state.store()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cartridges.csv\"",
            ),
        ],
        body,
    ))
}

/// GET /api/cartridge/eligible/:workflow
pub async fn list_eligible(
    State(state): State<AppState>,
    Path(workflow): Path<String>,
) -> LifecycleResult<Json<Vec<Cartridge>>> {
    let workflow = CartridgeWorkflow::from_code(&workflow).ok_or_else(|| {
        LifecycleError::Validation(format!("Неизвестная операция: {}", workflow))
    })?;
    Ok(Json(
        a001_cartridge::service::list_eligible(state.store(), workflow).await?,
    ))
}

/// GET /api/cartridge/by-number/:number
pub async fn get_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> LifecycleResult<Json<Cartridge>> {
    Ok(Json(
        a001_cartridge::service::find_by_number(state.store(), &number).await?,
    ))
}

/// GET /api/cartridge/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LifecycleResult<Json<Cartridge>> {
    let id: CartridgeId = parse_id(&id)?;
    Ok(Json(a001_cartridge::service::get_by_id(state.store(), id).await?))
}

/// PUT /api/cartridge/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(dto): JsonBody<SetStatusDto>,
) -> LifecycleResult<Json<Cartridge>> {
    let id: CartridgeId = parse_id(&id)?;
    let updated = a001_cartridge::service::set_status(state.store(), id, dto.status).await?;
    Ok(Json(updated))
}

/// GET /api/cartridge/:id/history
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LifecycleResult<Json<Vec<CartridgeStatusChange>>> {
    let id: CartridgeId = parse_id(&id)?;
    Ok(Json(
        a001_cartridge::service::status_history(state.store(), id).await?,
    ))
}

/// POST /api/cartridge/testdata
pub async fn insert_test_data(
    State(state): State<AppState>,
) -> LifecycleResult<Json<DemoDataReport>> {
    Ok(Json(initialization::seed_demo_data(state.store()).await?))
}
