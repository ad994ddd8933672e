use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{agency, dashboard_snapshot, inventory_bin},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAgency {
    pub name: String,
    pub allocation: i64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub id: i32,
    pub total_capacity: i64,
    pub current_usage: i64,
    pub agencies: Vec<DashboardAgency>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<dashboard_snapshot::Model> for DashboardView {
    type Error = ServiceError;

    fn try_from(model: dashboard_snapshot::Model) -> Result<Self, Self::Error> {
        let agencies = serde_json::from_value(model.agencies)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        Ok(Self {
            id: model.id,
            total_capacity: model.total_capacity,
            current_usage: model.current_usage,
            agencies,
            created_at: model.created_at,
        })
    }
}

/// Totals over every bin plus the allocation list, in agency name order.
pub fn summarize(
    bins: &[inventory_bin::Model],
    agencies: &[agency::Model],
) -> (i64, i64, Vec<DashboardAgency>) {
    let total_capacity = bins.iter().map(|b| b.capacity).sum();
    let current_usage = bins.iter().map(|b| b.current_stock).sum();
    let mut rows: Vec<DashboardAgency> = agencies
        .iter()
        .map(|a| DashboardAgency {
            name: a.name.clone(),
            allocation: a.allocation,
            last_updated: a.last_updated,
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    (total_capacity, current_usage, rows)
}

/// Computes a fresh snapshot from current bins and agencies and stores it.
pub async fn store_snapshot<C: ConnectionTrait>(
    conn: &C,
) -> Result<dashboard_snapshot::Model, ServiceError> {
    let bins = inventory_bin::Entity::find().all(conn).await?;
    let agencies = agency::Entity::find().all(conn).await?;
    let (total_capacity, current_usage, rows) = summarize(&bins, &agencies);
    let agencies_json =
        serde_json::to_value(&rows).map_err(|e| ServiceError::SerializationError(e.to_string()))?;

    Ok(dashboard_snapshot::ActiveModel {
        total_capacity: Set(total_capacity),
        current_usage: Set(current_usage),
        agencies: Set(agencies_json),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// The most recently stored snapshot.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> Result<DashboardView, ServiceError> {
        dashboard_snapshot::Entity::find()
            .order_by_desc(dashboard_snapshot::Column::Id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No dashboard data found".to_string()))?
            .try_into()
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<DashboardView, ServiceError> {
        let snapshot = store_snapshot(&*self.db_pool).await?;
        info!(
            snapshot_id = snapshot.id,
            total_capacity = snapshot.total_capacity,
            current_usage = snapshot.current_usage,
            "Dashboard snapshot stored"
        );
        self.event_sender
            .send_or_log(Event::DashboardRefreshed {
                snapshot_id: snapshot.id,
                total_capacity: snapshot.total_capacity,
                current_usage: snapshot.current_usage,
            })
            .await;
        snapshot.try_into()
    }
}
