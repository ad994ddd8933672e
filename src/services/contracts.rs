use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        bin_history::{self, HistoryKind},
        contract::{self, ContractStatus},
        sales_rep,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    #[validate(length(min = 1, max = 100))]
    pub withdrawal_frequency: String,
    #[validate(length(min = 1, max = 200))]
    pub return_policy: String,
    #[validate(range(min = 0))]
    pub minimum_order: i64,
    /// `0` means no upper bound
    #[validate(range(min = 0))]
    pub maximum_order: i64,
}

impl Default for ContractTerms {
    fn default() -> Self {
        Self {
            withdrawal_frequency: "daily".to_string(),
            return_policy: "within 7 days".to_string(),
            minimum_order: 10,
            maximum_order: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractInput {
    pub sr_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub monthly_limit: i64,
    pub status: Option<ContractStatus>,
    #[validate]
    #[serde(default)]
    pub terms: ContractTerms,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractInput {
    pub sr_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub monthly_limit: Option<i64>,
    pub status: Option<ContractStatus>,
    #[validate]
    pub terms: Option<ContractTerms>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContractFilter {
    pub sr_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractView {
    pub id: Uuid,
    pub sr_id: Uuid,
    /// `null` when the sales rep no longer exists
    pub sr_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub monthly_limit: i64,
    pub status: ContractStatus,
    pub terms: ContractTerms,
    /// Withdrawn by the rep so far this UTC month. Reported, not enforced.
    pub current_month_usage: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractView {
    fn build(model: contract::Model, sr_name: Option<String>, usage: i64) -> Self {
        Self {
            id: model.id,
            sr_id: model.sales_rep_id,
            sr_name,
            start_date: model.start_date,
            end_date: model.end_date,
            monthly_limit: model.monthly_limit,
            status: model.status,
            terms: ContractTerms {
                withdrawal_frequency: model.withdrawal_frequency,
                return_policy: model.return_policy,
                minimum_order: model.minimum_order,
                maximum_order: model.maximum_order,
            },
            current_month_usage: usage,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Start of the UTC calendar month containing `now`, and start of the next one.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);
    (
        Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN)),
    )
}

fn check_dates_and_terms(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    terms: &ContractTerms,
) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::ValidationError(
            "endDate must be after startDate".to_string(),
        ));
    }
    if terms.maximum_order != 0 && terms.maximum_order < terms.minimum_order {
        return Err(ServiceError::ValidationError(
            "maximumOrder must be 0 or at least minimumOrder".to_string(),
        ));
    }
    Ok(())
}

/// Sums withdraw quantities per rep inside `[from, to)`.
async fn usage_by_rep<C: ConnectionTrait>(
    conn: &C,
    rep_ids: Vec<Uuid>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<HashMap<Uuid, i64>, ServiceError> {
    if rep_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = bin_history::Entity::find()
        .filter(bin_history::Column::Kind.eq(HistoryKind::Withdraw))
        .filter(bin_history::Column::SalesRepId.is_in(rep_ids))
        .filter(bin_history::Column::RecordedAt.gte(from))
        .filter(bin_history::Column::RecordedAt.lt(to))
        .all(conn)
        .await?;

    let mut usage = HashMap::new();
    for row in rows {
        if let Some(rep) = row.sales_rep_id {
            *usage.entry(rep).or_insert(0) += row.quantity;
        }
    }
    Ok(usage)
}

#[derive(Clone)]
pub struct ContractService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ContractService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn views(&self, models: Vec<contract::Model>) -> Result<Vec<ContractView>, ServiceError> {
        let db = &*self.db_pool;
        let mut rep_ids: Vec<Uuid> = models.iter().map(|c| c.sales_rep_id).collect();
        rep_ids.sort();
        rep_ids.dedup();

        let names: HashMap<Uuid, String> = if rep_ids.is_empty() {
            HashMap::new()
        } else {
            sales_rep::Entity::find()
                .filter(sales_rep::Column::Id.is_in(rep_ids.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|r| (r.id, r.name))
                .collect()
        };
        let (from, to) = month_bounds(Utc::now());
        let usage = usage_by_rep(db, rep_ids, from, to).await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let name = names.get(&m.sales_rep_id).cloned();
                let used = usage.get(&m.sales_rep_id).copied().unwrap_or(0);
                ContractView::build(m, name, used)
            })
            .collect())
    }

    async fn view(&self, model: contract::Model) -> Result<ContractView, ServiceError> {
        let id = model.id;
        self.views(vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError(format!("contract {} vanished", id)))
    }

    async fn find(&self, id: Uuid) -> Result<contract::Model, ServiceError> {
        contract::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Contract not found: {}", id)))
    }

    async fn ensure_sales_rep(&self, id: Uuid) -> Result<(), ServiceError> {
        sales_rep::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::ValidationError(format!("Unknown sales rep: {}", id)))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: ContractFilter) -> Result<Vec<ContractView>, ServiceError> {
        let mut query = contract::Entity::find().order_by_asc(contract::Column::StartDate);
        if let Some(sr_id) = filter.sr_id {
            query = query.filter(contract::Column::SalesRepId.eq(sr_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(contract::Column::Status.eq(status));
        }
        let models = query.all(&*self.db_pool).await?;
        self.views(models).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ContractView, ServiceError> {
        let model = self.find(id).await?;
        self.view(model).await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateContractInput) -> Result<ContractView, ServiceError> {
        input.validate()?;
        check_dates_and_terms(input.start_date, input.end_date, &input.terms)?;
        self.ensure_sales_rep(input.sr_id).await?;

        let model = contract::ActiveModel {
            id: Set(Uuid::new_v4()),
            sales_rep_id: Set(input.sr_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            monthly_limit: Set(input.monthly_limit),
            status: Set(input.status.unwrap_or(ContractStatus::Active)),
            withdrawal_frequency: Set(input.terms.withdrawal_frequency),
            return_policy: Set(input.terms.return_policy),
            minimum_order: Set(input.terms.minimum_order),
            maximum_order: Set(input.terms.maximum_order),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(contract_id = %model.id, sales_rep_id = %model.sales_rep_id, "Contract created");
        self.event_sender
            .send_or_log(Event::ContractCreated(model.id))
            .await;
        self.view(model).await
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateContractInput,
    ) -> Result<ContractView, ServiceError> {
        input.validate()?;
        let existing = self.find(id).await?;

        let start = input.start_date.unwrap_or(existing.start_date);
        let end = input.end_date.unwrap_or(existing.end_date);
        let terms = input.terms.clone().unwrap_or_else(|| ContractTerms {
            withdrawal_frequency: existing.withdrawal_frequency.clone(),
            return_policy: existing.return_policy.clone(),
            minimum_order: existing.minimum_order,
            maximum_order: existing.maximum_order,
        });
        check_dates_and_terms(start, end, &terms)?;
        if let Some(sr_id) = input.sr_id {
            self.ensure_sales_rep(sr_id).await?;
        }

        let mut active: contract::ActiveModel = existing.into();
        if let Some(sr_id) = input.sr_id {
            active.sales_rep_id = Set(sr_id);
        }
        if let Some(limit) = input.monthly_limit {
            active.monthly_limit = Set(limit);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.start_date = Set(start);
        active.end_date = Set(end);
        active.withdrawal_frequency = Set(terms.withdrawal_frequency);
        active.return_policy = Set(terms.return_policy);
        active.minimum_order = Set(terms.minimum_order);
        active.maximum_order = Set(terms.maximum_order);

        let updated = active.update(&*self.db_pool).await?;
        info!(contract_id = %id, "Contract updated");
        self.event_sender
            .send_or_log(Event::ContractUpdated(id))
            .await;
        self.view(updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.find(id).await?;
        contract::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        info!(contract_id = %id, "Contract deleted");
        self.event_sender
            .send_or_log(Event::ContractDeleted(id))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn month_bounds_cover_the_calendar_month() {
        let now = Utc.with_ymd_and_hms(2024, 2, 17, 13, 45, 0).unwrap();
        let (from, to) = month_bounds(now);
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_bounds_roll_over_the_year() {
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let (from, to) = month_bounds(now);
        assert_eq!(from, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn end_must_follow_start() {
        let start = Utc::now();
        let terms = ContractTerms::default();
        assert_matches!(
            check_dates_and_terms(start, start, &terms),
            Err(ServiceError::ValidationError(_))
        );
        assert!(check_dates_and_terms(start, start + Duration::days(30), &terms).is_ok());
    }

    #[test]
    fn maximum_order_zero_is_unbounded() {
        let start = Utc::now();
        let end = start + Duration::days(1);
        let mut terms = ContractTerms {
            minimum_order: 50,
            maximum_order: 0,
            ..ContractTerms::default()
        };
        assert!(check_dates_and_terms(start, end, &terms).is_ok());
        terms.maximum_order = 20;
        assert_matches!(
            check_dates_and_terms(start, end, &terms),
            Err(ServiceError::ValidationError(msg)) if msg.contains("maximumOrder")
        );
    }

    #[test]
    fn negative_terms_fail_derive_validation() {
        let terms = ContractTerms {
            minimum_order: -1,
            ..ContractTerms::default()
        };
        assert!(terms.validate().is_err());
    }
}
