use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Read-side roll-up per (item, location, contract, org, dept, condition).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_sum")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    pub loc_id: i32,
    pub maintenance_contract_id: Option<i32>,
    pub org_id: Option<i32>,
    pub dept_id: Option<i32>,
    pub condition: Option<String>,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_cost: Decimal,
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
}

impl ActiveModelBehavior for ActiveModel {}
