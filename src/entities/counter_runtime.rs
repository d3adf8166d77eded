use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterStatus {
    Idle,
    Counting,
    Done,
}

/// Live state of one counter: which order it is counting for and what it has scanned.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "counter_runtime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub counter_id: i32,
    pub order_id: Option<i32>,
    pub status: String,
    pub expected_qty: i32,
    pub scanned_qty: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn state(&self) -> Option<CounterStatus> {
        self.status.parse().ok()
    }

    /// Scanned minus expected; negative while still short.
    pub fn variance(&self) -> i32 {
        self.scanned_qty - self.expected_qty
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::counter::Entity",
        from = "Column::CounterId",
        to = "super::counter::Column::Id"
    )]
    Counter,
}

impl Related<super::counter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Counter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
