use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{agency, contract, sales_rep, sales_rep::SalesPlan, RecordStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesRepInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub agency_id: Option<Uuid>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub withdrawal_limit: i64,
    pub plan: SalesPlan,
    pub status: Option<RecordStatus>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalesRepInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub agency_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub withdrawal_limit: Option<i64>,
    pub plan: Option<SalesPlan>,
    pub status: Option<RecordStatus>,
}

#[derive(Clone)]
pub struct SalesRepService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl SalesRepService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, agency_id: Option<Uuid>) -> Result<Vec<sales_rep::Model>, ServiceError> {
        let mut query = sales_rep::Entity::find().order_by_asc(sales_rep::Column::Name);
        if let Some(agency_id) = agency_id {
            query = query.filter(sales_rep::Column::AgencyId.eq(agency_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<sales_rep::Model, ServiceError> {
        sales_rep::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales rep not found: {}", id)))
    }

    async fn ensure_agency(&self, agency_id: Uuid) -> Result<(), ServiceError> {
        agency::Entity::find_by_id(agency_id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::ValidationError(format!("Unknown agency: {}", agency_id)))
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateSalesRepInput,
    ) -> Result<sales_rep::Model, ServiceError> {
        input.validate()?;
        if let Some(agency_id) = input.agency_id {
            self.ensure_agency(agency_id).await?;
        }

        let model = sales_rep::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email),
            phone: Set(input.phone),
            agency_id: Set(input.agency_id),
            withdrawal_limit: Set(input.withdrawal_limit),
            plan: Set(input.plan),
            status: Set(input.status.unwrap_or_default()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(sales_rep_id = %model.id, "Sales rep created");
        self.event_sender
            .send_or_log(Event::SalesRepCreated(model.id))
            .await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSalesRepInput,
    ) -> Result<sales_rep::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        if let Some(agency_id) = input.agency_id {
            self.ensure_agency(agency_id).await?;
        }

        let mut active: sales_rep::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(agency_id) = input.agency_id {
            active.agency_id = Set(Some(agency_id));
        }
        if let Some(limit) = input.withdrawal_limit {
            active.withdrawal_limit = Set(limit);
        }
        if let Some(plan) = input.plan {
            active.plan = Set(plan);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(sales_rep_id = %id, "Sales rep updated");
        self.event_sender
            .send_or_log(Event::SalesRepUpdated(id))
            .await;
        Ok(updated)
    }

    /// Deletes a sales rep and their contracts. History rows keep the id.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get(id).await?;
        let removed = self
            .db_pool
            .transaction::<_, u64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let contracts = contract::Entity::delete_many()
                        .filter(contract::Column::SalesRepId.eq(id))
                        .exec(txn)
                        .await?;
                    sales_rep::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(contracts.rows_affected)
                })
            })
            .await?;
        info!(sales_rep_id = %id, contracts_removed = removed, "Sales rep deleted");
        self.event_sender
            .send_or_log(Event::SalesRepDeleted(id))
            .await;
        Ok(())
    }
}
