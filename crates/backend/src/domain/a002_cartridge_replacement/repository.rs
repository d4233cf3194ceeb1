use chrono::Utc;
use contracts::domain::a002_cartridge_replacement::{CartridgeReplacement, CartridgeReplacementId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::domain::error::{LifecycleError, LifecycleResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_cartridge_replacement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub date: chrono::NaiveDate,
    pub department: String,
    pub installed_cartridge_number: String,
    pub removed_cartridge_number: String,
    pub responsible: String,
    pub comment: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CartridgeReplacement {
    type Error = LifecycleError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let id = CartridgeReplacementId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?;
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };

        Ok(CartridgeReplacement {
            base: BaseAggregate::restore(id, m.comment, metadata),
            date: m.date,
            department: m.department,
            installed_cartridge_number: m.installed_cartridge_number,
            removed_cartridge_number: m.removed_cartridge_number,
            responsible: m.responsible,
        })
    }
}

pub async fn list_all<C: ConnectionTrait>(db: &C) -> LifecycleResult<Vec<CartridgeReplacement>> {
    Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(CartridgeReplacement::try_from)
        .collect()
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    aggregate: &CartridgeReplacement,
) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(aggregate.to_string_id()),
        date: Set(aggregate.date),
        department: Set(aggregate.department.clone()),
        installed_cartridge_number: Set(aggregate.installed_cartridge_number.clone()),
        removed_cartridge_number: Set(aggregate.removed_cartridge_number.clone()),
        responsible: Set(aggregate.responsible.clone()),
        comment: Set(aggregate.base.comment.clone()),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    Entity::insert(active).exec(db).await?;
    Ok(())
}
