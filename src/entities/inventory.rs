use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

use crate::services::costing;

/// One lot: a quantity of one item at one location carrying one unit cost.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    pub loc_id: i32,
    /// Originating receipt; `None` for lots created by a transfer.
    pub receipt_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub unit_cost: Decimal,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_item::Entity",
        from = "Column::ItemId",
        to = "super::stock_item::Column::Id"
    )]
    StockItem,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::inventory_trx::Entity")]
    InventoryTrx,
    #[sea_orm(has_many = "super::usage_inventory::Entity")]
    UsageInventory,
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItem.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::inventory_trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryTrx.def()
    }
}

impl Related<super::usage_inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageInventory.def()
    }
}

fn current<V: Clone + Into<sea_orm::Value>>(value: &ActiveValue<V>) -> Option<V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.clone()),
        ActiveValue::NotSet => None,
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Keeps `quantity >= 0` and `total_cost == round(quantity * unit_cost, 2)` on every write.
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut lot = self;

        if let (Some(quantity), Some(unit_cost)) = (current(&lot.quantity), current(&lot.unit_cost))
        {
            if quantity < 0 {
                return Err(DbErr::Custom(format!(
                    "inventory quantity cannot be negative (got {})",
                    quantity
                )));
            }
            let unit_cost = costing::round_money(unit_cost);
            lot.unit_cost = Set(unit_cost);
            lot.total_cost = Set(costing::line_total(quantity, unit_cost));
        }

        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = lot.created_at {
                lot.created_at = Set(now);
            }
            if let ActiveValue::NotSet = lot.is_active {
                lot.is_active = Set(true);
            }
        }
        lot.updated_at = Set(now);

        Ok(lot)
    }
}

impl Model {
    /// True when the stored total matches the quantity and unit cost.
    pub fn is_consistent(&self) -> bool {
        self.quantity >= 0 && self.total_cost == costing::line_total(self.quantity, self.unit_cost)
    }
}
