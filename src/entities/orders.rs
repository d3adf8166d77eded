use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Order types that post to the inventory ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum OrderType {
    Receipt,
    Usage,
    Return,
    Transfer,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Receipt => "RECEIPT",
            OrderType::Usage => "USAGE",
            OrderType::Return => "RETURN",
            OrderType::Transfer => "TRANSFER",
        }
    }

    /// Whether a posting of this type needs an operator-selected lot.
    pub fn requires_lot(&self) -> bool {
        matches!(self, OrderType::Usage | OrderType::Return)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_no: String,
    pub order_type: String, // Stored as string in DB, converted through OrderType
    pub item_id: Option<i32>,
    pub loc_id: Option<i32>,
    pub actual_qty: Option<i32>,
    pub status: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Parses the stored order type.
    pub fn kind(&self) -> Option<OrderType> {
        self.order_type.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory_trx::Entity")]
    InventoryTrx,
}

impl Related<super::inventory_trx::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryTrx.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_type_round_trips_through_storage_string() {
        for kind in [
            OrderType::Receipt,
            OrderType::Usage,
            OrderType::Return,
            OrderType::Transfer,
        ] {
            assert_eq!(kind.as_str().parse::<OrderType>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert_eq!("transfer".parse::<OrderType>().unwrap(), OrderType::Transfer);
        assert!("ADJUST".parse::<OrderType>().is_err());
    }

    #[test]
    fn only_usage_and_return_need_a_lot() {
        assert!(OrderType::Usage.requires_lot());
        assert!(OrderType::Return.requires_lot());
        assert!(!OrderType::Receipt.requires_lot());
        assert!(!OrderType::Transfer.requires_lot());
    }
}
