use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use contracts::domain::a003_service_batch::{
    BatchCartridge, BatchProgress, BatchSummary, CreateServiceBatchDto, ReceiveCartridgesDto,
    ServiceBatch, ServiceBatchId,
};
use contracts::enums::BatchListFilter;
use serde::{Deserialize, Serialize};

use super::{parse_id, JsonBody};
use crate::domain::a003_service_batch;
use crate::domain::error::LifecycleResult;
use crate::system::app_state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub state: Option<BatchListFilter>,
}

/// Партия вместе с прогрессом возврата
#[derive(Debug, Serialize)]
pub struct ServiceBatchView {
    #[serde(flatten)]
    pub batch: ServiceBatch,
    pub progress: BatchProgress,
}

impl From<ServiceBatch> for ServiceBatchView {
    fn from(batch: ServiceBatch) -> Self {
        let progress = batch.progress();
        Self { batch, progress }
    }
}

/// GET /api/service_batch?state=open|completed
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> LifecycleResult<Json<Vec<ServiceBatchView>>> {
    let items = a003_service_batch::service::list(state.store(), query.state).await?;
    Ok(Json(items.into_iter().map(ServiceBatchView::from).collect()))
}

/// POST /api/service_batch
pub async fn create(
    State(state): State<AppState>,
    JsonBody(dto): JsonBody<CreateServiceBatchDto>,
) -> LifecycleResult<(StatusCode, Json<ServiceBatchView>)> {
    let batch = a003_service_batch::service::create_batch(state.store(), dto).await?;
    Ok((StatusCode::CREATED, Json(batch.into())))
}

/// GET /api/service_batch/summary
pub async fn summary(State(state): State<AppState>) -> LifecycleResult<Json<BatchSummary>> {
    Ok(Json(a003_service_batch::service::summary(state.store()).await?))
}

/// GET /api/service_batch/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LifecycleResult<Json<ServiceBatchView>> {
    let id: ServiceBatchId = parse_id(&id)?;
    let batch = a003_service_batch::service::get_by_id(state.store(), id).await?;
    Ok(Json(batch.into()))
}

/// GET /api/service_batch/:id/pending
pub async fn pending(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LifecycleResult<Json<Vec<BatchCartridge>>> {
    let id: ServiceBatchId = parse_id(&id)?;
    Ok(Json(
        a003_service_batch::service::pending_cartridges(state.store(), id).await?,
    ))
}

/// POST /api/service_batch/:id/receive
pub async fn receive(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(dto): JsonBody<ReceiveCartridgesDto>,
) -> LifecycleResult<Json<ServiceBatchView>> {
    let id: ServiceBatchId = parse_id(&id)?;
    let batch = a003_service_batch::service::receive_cartridges(state.store(), id, dto).await?;
    Ok(Json(batch.into()))
}

/// GET /api/service_batch/:id/manifest
pub async fn manifest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> LifecycleResult<Html<String>> {
    let id: ServiceBatchId = parse_id(&id)?;
    let manifest = a003_service_batch::service::manifest(state.store(), id).await?;
    Ok(Html(a003_service_batch::manifest::render_html(&manifest)))
}
