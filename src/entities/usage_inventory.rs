use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Which lot a usage order drew from, and how much.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub usage_id: i32,
    pub inv_id: i32,
    pub usage_qty: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders_usage::Entity",
        from = "Column::UsageId",
        to = "super::orders_usage::Column::Id"
    )]
    Usage,
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InvId",
        to = "super::inventory::Column::Id"
    )]
    Inventory,
    #[sea_orm(has_many = "super::return_inventory::Entity")]
    Returns,
}

impl Related<super::orders_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Usage.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl Related<super::return_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Returns.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut link = self;
        if insert {
            if let ActiveValue::NotSet = link.created_at {
                link.created_at = Set(Utc::now());
            }
        }
        Ok(link)
    }
}
