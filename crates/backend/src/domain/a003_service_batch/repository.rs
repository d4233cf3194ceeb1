use chrono::Utc;
use contracts::domain::a003_service_batch::{ServiceBatch, ServiceBatchId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::enums::BatchStatus;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::domain::error::{LifecycleError, LifecycleResult};

/// Партия в сервис
///
/// Состав партии и журнал возвратов хранятся JSON-текстом,
/// так же как строки документа в других агрегатах.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_service_batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub batch_number: String,
    pub date: chrono::NaiveDate,
    pub responsible: String,
    pub notes: Option<String>,
    pub status: String,
    pub cartridges_json: String,
    pub returned_cartridges_json: String,
    pub partial_return_date: Option<chrono::NaiveDate>,
    pub partial_return_responsible: Option<String>,
    pub cartridge_returns_json: String,
    pub comment: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ServiceBatch {
    type Error = LifecycleError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let status = BatchStatus::from_code(&m.status).ok_or_else(|| {
            anyhow::anyhow!("Unknown batch status '{}' for {}", m.status, m.batch_number)
        })?;
        let id = ServiceBatchId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?;
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };

        Ok(ServiceBatch {
            base: BaseAggregate::restore(id, m.comment, metadata),
            batch_number: m.batch_number,
            date: m.date,
            responsible: m.responsible,
            notes: m.notes,
            status,
            cartridges: serde_json::from_str(&m.cartridges_json)?,
            returned_cartridges: serde_json::from_str(&m.returned_cartridges_json)?,
            partial_return_date: m.partial_return_date,
            partial_return_responsible: m.partial_return_responsible,
            cartridge_returns: serde_json::from_str(&m.cartridge_returns_json)?,
        })
    }
}

/// Все поля, кроме id и created_at, которые не меняются после вставки
fn to_active_model(aggregate: &ServiceBatch) -> LifecycleResult<ActiveModel> {
    Ok(ActiveModel {
        id: NotSet,
        batch_number: Set(aggregate.batch_number.clone()),
        date: Set(aggregate.date),
        responsible: Set(aggregate.responsible.clone()),
        notes: Set(aggregate.notes.clone()),
        status: Set(aggregate.status.code().to_string()),
        cartridges_json: Set(serde_json::to_string(&aggregate.cartridges)?),
        returned_cartridges_json: Set(serde_json::to_string(&aggregate.returned_cartridges)?),
        partial_return_date: Set(aggregate.partial_return_date),
        partial_return_responsible: Set(aggregate.partial_return_responsible.clone()),
        cartridge_returns_json: Set(serde_json::to_string(&aggregate.cartridge_returns)?),
        comment: Set(aggregate.base.comment.clone()),
        created_at: NotSet,
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

fn into_aggregates(models: Vec<Model>) -> LifecycleResult<Vec<ServiceBatch>> {
    models.into_iter().map(ServiceBatch::try_from).collect()
}

pub async fn list_all<C: ConnectionTrait>(db: &C) -> LifecycleResult<Vec<ServiceBatch>> {
    let models = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;
    into_aggregates(models)
}

pub async fn get_by_id<C: ConnectionTrait>(
    db: &C,
    id: ServiceBatchId,
) -> LifecycleResult<Option<ServiceBatch>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .map(ServiceBatch::try_from)
        .transpose()
}

pub async fn get_by_batch_number<C: ConnectionTrait>(
    db: &C,
    batch_number: &str,
) -> LifecycleResult<Option<ServiceBatch>> {
    Entity::find()
        .filter(Column::BatchNumber.eq(batch_number))
        .one(db)
        .await?
        .map(ServiceBatch::try_from)
        .transpose()
}

pub async fn insert<C: ConnectionTrait>(db: &C, aggregate: &ServiceBatch) -> LifecycleResult<()> {
    let mut active = to_active_model(aggregate)?;
    active.id = Set(aggregate.to_string_id());
    active.created_at = Set(Some(aggregate.base.metadata.created_at));
    Entity::insert(active).exec(db).await?;
    Ok(())
}

/// Обновление с проверкой версии
pub async fn update_versioned<C: ConnectionTrait>(
    db: &C,
    aggregate: &ServiceBatch,
    expected_version: i32,
) -> LifecycleResult<bool> {
    let active = to_active_model(aggregate)?;
    let result = Entity::update_many()
        .set(active)
        .filter(Column::Id.eq(aggregate.to_string_id()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn exists_by_batch_number<C: ConnectionTrait>(
    db: &C,
    batch_number: &str,
) -> Result<bool, DbErr> {
    let found = Entity::find()
        .filter(Column::BatchNumber.eq(batch_number))
        .one(db)
        .await?;
    Ok(found.is_some())
}
