use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical pick counter installed at a location.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "m_counter")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub counter_code: String,
    pub loc_id: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(has_one = "super::counter_runtime::Entity")]
    Runtime,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::counter_runtime::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Runtime.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
