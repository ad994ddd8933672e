use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Point-in-time dashboard totals. The newest row (highest id) is current.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dashboard_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub total_capacity: i64,
    pub current_usage: i64,
    /// `[{name, allocation, lastUpdated}]`
    #[sea_orm(column_type = "Json")]
    pub agencies: Json,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
