use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    #[sea_orm(string_value = "add")]
    Add,
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Add => "add",
            HistoryKind::Withdraw => "withdraw",
            HistoryKind::Transfer => "transfer",
        }
    }
}

/// Append-only audit row. The auto-increment id is the insertion order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bin_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub bin_id: Uuid,
    pub kind: HistoryKind,
    pub agency_id: Option<Uuid>,
    pub sales_rep_id: Option<Uuid>,
    pub quantity: i64,
    pub stock_after: i64,
    /// The other side of a transfer.
    pub counterpart_bin_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_bin::Entity",
        from = "Column::BinId",
        to = "super::inventory_bin::Column::Id"
    )]
    Bin,
}

impl Related<super::inventory_bin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bin.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.recorded_at {
            active_model.recorded_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
