use chrono::Utc;
use contracts::domain::a001_cartridge::{Cartridge, CartridgeId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::enums::CartridgeStatus;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::domain::error::{LifecycleError, LifecycleResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_cartridge")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    pub model: String,
    pub status: String,
    pub return_date: Option<chrono::NaiveDate>,
    pub return_responsible: Option<String>,
    pub comment: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Cartridge {
    type Error = LifecycleError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let status = CartridgeStatus::from_code(&m.status).ok_or_else(|| {
            anyhow::anyhow!("Unknown cartridge status '{}' for {}", m.status, m.id)
        })?;
        let id = CartridgeId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?;
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };

        Ok(Cartridge {
            base: BaseAggregate::restore(id, m.comment, metadata),
            number: m.number,
            model: m.model,
            status,
            return_date: m.return_date,
            return_responsible: m.return_responsible,
        })
    }
}

fn into_aggregates(models: Vec<Model>) -> LifecycleResult<Vec<Cartridge>> {
    models.into_iter().map(Cartridge::try_from).collect()
}

pub async fn list_all<C: ConnectionTrait>(db: &C) -> LifecycleResult<Vec<Cartridge>> {
    let models = Entity::find()
        .order_by_asc(Column::Number)
        .all(db)
        .await?;
    into_aggregates(models)
}

pub async fn get_by_id<C: ConnectionTrait>(
    db: &C,
    id: CartridgeId,
) -> LifecycleResult<Option<Cartridge>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .map(Cartridge::try_from)
        .transpose()
}

pub async fn get_by_number<C: ConnectionTrait>(
    db: &C,
    number: &str,
) -> LifecycleResult<Option<Cartridge>> {
    Entity::find()
        .filter(Column::Number.eq(number))
        .one(db)
        .await?
        .map(Cartridge::try_from)
        .transpose()
}

pub async fn insert<C: ConnectionTrait>(db: &C, aggregate: &Cartridge) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.as_string()),
        number: Set(aggregate.number.clone()),
        model: Set(aggregate.model.clone()),
        status: Set(aggregate.status.code().to_string()),
        return_date: Set(aggregate.return_date),
        return_responsible: Set(aggregate.return_responsible.clone()),
        comment: Set(aggregate.base.comment.clone()),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    Entity::insert(active).exec(db).await?;
    Ok(())
}

/// Обновление с проверкой версии (optimistic locking)
///
/// Возвращает false, если в БД другая версия записи.
pub async fn update_versioned<C: ConnectionTrait>(
    db: &C,
    aggregate: &Cartridge,
    expected_version: i32,
) -> Result<bool, DbErr> {
    let active = ActiveModel {
        id: NotSet,
        number: Set(aggregate.number.clone()),
        model: Set(aggregate.model.clone()),
        status: Set(aggregate.status.code().to_string()),
        return_date: Set(aggregate.return_date),
        return_responsible: Set(aggregate.return_responsible.clone()),
        comment: Set(aggregate.base.comment.clone()),
        created_at: NotSet,
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    let result = Entity::update_many()
        .set(active)
        .filter(Column::Id.eq(aggregate.base.id.as_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn exists_by_number<C: ConnectionTrait>(db: &C, number: &str) -> Result<bool, DbErr> {
    let found = Entity::find()
        .filter(Column::Number.eq(number))
        .one(db)
        .await?;
    Ok(found.is_some())
}
