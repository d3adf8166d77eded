use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use super::orders::OrderType;

/// Append-only movement record. `qty` is positive inbound, negative outbound.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_trx")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub inv_id: i32,
    pub order_id: i32,
    pub order_type: String, // Stored as string in DB, converted through OrderType
    pub item_id: i32,
    pub loc_id: i32,
    pub qty: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub unit_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn kind(&self) -> Option<OrderType> {
        self.order_type.parse().ok()
    }

    pub fn is_inbound(&self) -> bool {
        self.qty > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory::Entity",
        from = "Column::InvId",
        to = "super::inventory::Column::Id"
    )]
    Inventory,
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Order,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            return Err(DbErr::Custom(
                "inventory transactions are append-only".to_string(),
            ));
        }
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
