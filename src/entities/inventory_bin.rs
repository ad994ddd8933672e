use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A shared storage bin. `current_stock` stays within `0..=capacity`; the
/// inventory service only changes it through guarded conditional updates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_bins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human-readable code such as `BIN-001`.
    #[sea_orm(unique)]
    pub bin_code: String,
    pub name: String,
    pub capacity: i64,
    pub current_stock: i64,
    pub seed_type: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bin_agency::Entity")]
    BinAgencies,
    #[sea_orm(has_many = "super::withdrawal_limit::Entity")]
    WithdrawalLimits,
    #[sea_orm(has_many = "super::bin_history::Entity")]
    History,
}

impl Related<super::bin_agency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BinAgencies.def()
    }
}

impl Related<super::withdrawal_limit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WithdrawalLimits.def()
    }
}

impl Related<super::bin_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
