use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// A (possibly partial) return against one usage/lot link.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "return_inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub return_id: i32,
    pub usage_inventory_id: i32,
    pub inv_id: i32,
    pub return_qty: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders_return::Entity",
        from = "Column::ReturnId",
        to = "super::orders_return::Column::Id"
    )]
    Return,
    #[sea_orm(
        belongs_to = "super::usage_inventory::Entity",
        from = "Column::UsageInventoryId",
        to = "super::usage_inventory::Column::Id"
    )]
    UsageInventory,
}

impl Related<super::orders_return::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Return.def()
    }
}

impl Related<super::usage_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageInventory.def()
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
