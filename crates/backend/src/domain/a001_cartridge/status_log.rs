use contracts::domain::a001_cartridge::{CartridgeId, CartridgeStatusChange, StatusChangeSource};
use contracts::domain::common::AggregateId;
use contracts::enums::CartridgeStatus;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::domain::error::{LifecycleError, LifecycleResult};

/// Журнал смены статусов картриджа (только INSERT)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_cartridge_status_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub cartridge_id: String,
    pub from_status: String,
    pub to_status: String,
    pub source: String,
    pub changed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse_status(code: &str) -> LifecycleResult<CartridgeStatus> {
    CartridgeStatus::from_code(code)
        .ok_or_else(|| anyhow::anyhow!("Unknown cartridge status '{}' in status log", code).into())
}

impl TryFrom<Model> for CartridgeStatusChange {
    type Error = LifecycleError;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let source = StatusChangeSource::from_code(&m.source)
            .ok_or_else(|| anyhow::anyhow!("Unknown status change source '{}'", m.source))?;

        Ok(CartridgeStatusChange {
            id: uuid::Uuid::parse_str(&m.id).map_err(anyhow::Error::from)?,
            cartridge_id: CartridgeId::from_string(&m.cartridge_id)
                .map_err(|e| anyhow::anyhow!(e))?,
            from_status: parse_status(&m.from_status)?,
            to_status: parse_status(&m.to_status)?,
            source,
            changed_at: m.changed_at,
        })
    }
}

pub async fn list_by_cartridge<C: ConnectionTrait>(
    db: &C,
    cartridge_id: CartridgeId,
) -> LifecycleResult<Vec<CartridgeStatusChange>> {
    Entity::find()
        .filter(Column::CartridgeId.eq(cartridge_id.as_string()))
        .order_by_asc(Column::ChangedAt)
        .all(db)
        .await?
        .into_iter()
        .map(CartridgeStatusChange::try_from)
        .collect()
}

pub async fn insert<C: ConnectionTrait>(db: &C, change: &CartridgeStatusChange) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(change.id.to_string()),
        cartridge_id: Set(change.cartridge_id.as_string()),
        from_status: Set(change.from_status.code().to_string()),
        to_status: Set(change.to_status.code().to_string()),
        source: Set(change.source.code().to_string()),
        changed_at: Set(change.changed_at),
    };
    Entity::insert(active).exec(db).await?;
    Ok(())
}
