use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{agency, bin_agency, withdrawal_limit, RecordStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgencyInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub allocation: i64,
    #[validate(length(max = 200))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub status: Option<RecordStatus>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgencyInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub allocation: Option<i64>,
    #[validate(length(max = 200))]
    pub contact_person: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Clone)]
pub struct AgencyService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl AgencyService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<agency::Model>, ServiceError> {
        Ok(agency::Entity::find()
            .order_by_asc(agency::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<agency::Model, ServiceError> {
        agency::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Agency not found: {}", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateAgencyInput) -> Result<agency::Model, ServiceError> {
        input.validate()?;

        let model = agency::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            allocation: Set(input.allocation),
            contact_person: Set(input.contact_person),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            status: Set(input.status.unwrap_or_default()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(agency_id = %model.id, name = %model.name, "Agency created");
        self.event_sender
            .send_or_log(Event::AgencyCreated(model.id))
            .await;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateAgencyInput,
    ) -> Result<agency::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;

        let mut active: agency::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(allocation) = input.allocation {
            active.allocation = Set(allocation);
        }
        if let Some(contact_person) = input.contact_person {
            active.contact_person = Set(Some(contact_person));
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }

        let updated = active.update(&*self.db_pool).await?;
        info!(agency_id = %id, "Agency updated");
        self.event_sender
            .send_or_log(Event::AgencyUpdated(id))
            .await;
        Ok(updated)
    }

    /// Deletes an agency that no bin refers to. Its sales reps become unassigned.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let memberships = bin_agency::Entity::find()
            .filter(bin_agency::Column::AgencyId.eq(id))
            .count(db)
            .await?;
        let limits = withdrawal_limit::Entity::find()
            .filter(withdrawal_limit::Column::AgencyId.eq(id))
            .count(db)
            .await?;
        if memberships + limits > 0 {
            return Err(ServiceError::Conflict(format!(
                "Agency {} is still attached to one or more bins",
                id
            )));
        }

        agency::Entity::delete_by_id(id).exec(db).await?;
        info!(agency_id = %id, "Agency deleted");
        self.event_sender
            .send_or_log(Event::AgencyDeleted(id))
            .await;
        Ok(())
    }
}
