//! Database entities.
//!
//! Bins keep their owner/sharer membership, per-agency limits and history in
//! side tables so that every mutation can be expressed as plain row updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod agency;
pub mod bin_agency;
pub mod bin_history;
pub mod contract;
pub mod dashboard_snapshot;
pub mod inventory_bin;
pub mod sales_rep;
pub mod withdrawal_limit;

/// Lifecycle flag shared by agencies and sales reps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}
