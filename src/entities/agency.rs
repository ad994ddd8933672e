use super::RecordStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Units allotted to the agency, shown on the dashboard.
    pub allocation: i64,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_rep::Entity")]
    SalesReps,
    #[sea_orm(has_many = "super::bin_agency::Entity")]
    BinAgencies,
    #[sea_orm(has_many = "super::withdrawal_limit::Entity")]
    WithdrawalLimits,
}

impl Related<super::sales_rep::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesReps.def()
    }
}

impl Related<super::bin_agency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BinAgencies.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert && active_model.created_at.is_not_set() {
            active_model.created_at = Set(now);
        }
        active_model.last_updated = Set(now);
        Ok(active_model)
    }
}
