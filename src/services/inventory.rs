//! Bin inventory: guarded stock mutations, resolved listings, history and the
//! per-agency aggregate.
//!
//! Every mutation runs in one database transaction. Stock changes are single
//! conditional `UPDATE`s, so the row is re-checked at write time and concurrent
//! requests can neither overdraw nor overfill a bin. The history row is written
//! in the same transaction as the stock change.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Query}, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        agency, bin_agency,
        bin_agency::BinRole,
        bin_history::{self, HistoryKind},
        inventory_bin, sales_rep, withdrawal_limit,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Who is moving stock, and how much.
#[derive(Debug, Clone, Copy)]
pub struct BinMutation {
    pub quantity: i64,
    pub agency_id: Uuid,
    pub sales_rep_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalLimitView {
    pub agency: NamedRef,
    pub limit: i64,
}

/// A bin with its agency references resolved to names.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BinView {
    pub id: Uuid,
    /// Human-readable bin code, e.g. `BIN-001`
    pub bin_id: String,
    pub name: String,
    pub capacity: i64,
    pub current_stock: i64,
    pub seed_type: String,
    pub last_updated: DateTime<Utc>,
    pub owners: Vec<NamedRef>,
    pub sharers: Vec<NamedRef>,
    pub withdrawal_limits: Vec<WithdrawalLimitView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    /// `null` when the agency no longer exists
    pub agency: Option<NamedRef>,
    /// `null` when the sales rep no longer exists
    pub sales_rep: Option<NamedRef>,
    pub quantity: i64,
    pub stock_after: i64,
    pub counterpart_bin_id: Option<Uuid>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgencyBinStock {
    /// Bin display name
    pub bin: String,
    pub bin_id: String,
    pub stock: i64,
}

/// Stock visible to one agency across every bin it owns or shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgencyStock {
    pub agency_id: Uuid,
    pub agency: String,
    pub total: i64,
    pub bins: Vec<AgencyBinStock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferOutcome {
    pub source: BinView,
    pub target: BinView,
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Resolves a bin by storage id or by its `BIN-xxx` code.
    pub async fn find_bin(&self, key: &str) -> Result<inventory_bin::Model, ServiceError> {
        resolve_bin(&*self.db_pool, key).await
    }

    #[instrument(skip(self))]
    pub async fn list_bins(&self) -> Result<Vec<BinView>, ServiceError> {
        let db = &*self.db_pool;
        let bins = inventory_bin::Entity::find()
            .order_by_asc(inventory_bin::Column::BinCode)
            .all(db)
            .await?;
        let memberships = bin_agency::Entity::find().all(db).await?;
        let limits = withdrawal_limit::Entity::find().all(db).await?;
        let names = agency_names(db, None).await?;
        Ok(bins
            .into_iter()
            .map(|bin| assemble_view(bin, &memberships, &limits, &names))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_bin(&self, key: &str) -> Result<BinView, ServiceError> {
        let bin = self.find_bin(key).await?;
        self.view_of(bin).await
    }

    async fn view_of(&self, bin: inventory_bin::Model) -> Result<BinView, ServiceError> {
        let db = &*self.db_pool;
        let memberships = bin_agency::Entity::find()
            .filter(bin_agency::Column::BinId.eq(bin.id))
            .all(db)
            .await?;
        let limits = withdrawal_limit::Entity::find()
            .filter(withdrawal_limit::Column::BinId.eq(bin.id))
            .all(db)
            .await?;
        let ids: Vec<Uuid> = memberships
            .iter()
            .map(|m| m.agency_id)
            .chain(limits.iter().map(|l| l.agency_id))
            .collect();
        let names = agency_names(db, Some(ids)).await?;
        Ok(assemble_view(bin, &memberships, &limits, &names))
    }

    async fn view_by_id(&self, id: Uuid) -> Result<BinView, ServiceError> {
        let bin = inventory_bin::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::bin_not_found(id))?;
        self.view_of(bin).await
    }

    /// Adds stock to a bin. Rejected when the result would exceed capacity.
    #[instrument(skip(self))]
    pub async fn add_stock(&self, key: &str, cmd: BinMutation) -> Result<BinView, ServiceError> {
        validate_quantity(cmd.quantity)?;
        let bin_id = self.find_bin(key).await?.id;

        let result = self
            .db_pool
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    if !try_add(txn, bin_id, cmd.quantity, now).await? {
                        return Err(capacity_rejection(txn, bin_id, cmd.quantity).await?);
                    }
                    let stock_after = current_stock(txn, bin_id).await?;
                    record_history(
                        txn,
                        bin_id,
                        HistoryKind::Add,
                        cmd,
                        stock_after,
                        None,
                        now,
                    )
                    .await?;
                    Ok(stock_after)
                })
            })
            .await
            .map_err(ServiceError::from);

        let stock_after = self.finish(bin_id, cmd, result).await?;
        info!(%bin_id, quantity = cmd.quantity, stock_after, "Added stock to bin");
        self.event_sender
            .send_or_log(Event::StockAdded {
                bin_id,
                agency_id: cmd.agency_id,
                sales_rep_id: cmd.sales_rep_id,
                quantity: cmd.quantity,
                stock_after,
                at: Utc::now(),
            })
            .await;

        self.view_by_id(bin_id).await
    }

    /// Withdraws stock. The agency limit is checked before stock.
    #[instrument(skip(self))]
    pub async fn withdraw_stock(
        &self,
        key: &str,
        cmd: BinMutation,
    ) -> Result<BinView, ServiceError> {
        validate_quantity(cmd.quantity)?;
        let bin_id = self.find_bin(key).await?.id;

        let result = self
            .db_pool
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    if !try_withdraw(txn, bin_id, cmd.agency_id, cmd.quantity, now).await? {
                        return Err(
                            withdraw_rejection(txn, bin_id, cmd.agency_id, cmd.quantity).await?,
                        );
                    }
                    let stock_after = current_stock(txn, bin_id).await?;
                    record_history(
                        txn,
                        bin_id,
                        HistoryKind::Withdraw,
                        cmd,
                        stock_after,
                        None,
                        now,
                    )
                    .await?;
                    Ok(stock_after)
                })
            })
            .await
            .map_err(ServiceError::from);

        let stock_after = self.finish(bin_id, cmd, result).await?;
        info!(%bin_id, quantity = cmd.quantity, stock_after, "Withdrew stock from bin");
        self.event_sender
            .send_or_log(Event::StockWithdrawn {
                bin_id,
                agency_id: cmd.agency_id,
                sales_rep_id: cmd.sales_rep_id,
                quantity: cmd.quantity,
                stock_after,
                at: Utc::now(),
            })
            .await;

        self.view_by_id(bin_id).await
    }

    /// Moves stock between two bins atomically. The source applies the
    /// withdrawal rules and the target applies the capacity rule.
    #[instrument(skip(self))]
    pub async fn transfer_stock(
        &self,
        source_key: &str,
        target_key: &str,
        cmd: BinMutation,
    ) -> Result<TransferOutcome, ServiceError> {
        validate_quantity(cmd.quantity)?;
        let source = self.find_bin(source_key).await?;
        let target = self.find_bin(target_key).await?;
        if source.id == target.id {
            return Err(ServiceError::ValidationError(
                "Source and target bins must differ".to_string(),
            ));
        }
        let (source_id, target_id) = (source.id, target.id);

        let result = self
            .db_pool
            .transaction::<_, i64, ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let (mut withdrawn, mut added) = (false, false);
                    for id in update_order(source_id, target_id) {
                        if id == source_id {
                            withdrawn =
                                try_withdraw(txn, source_id, cmd.agency_id, cmd.quantity, now)
                                    .await?;
                        } else {
                            added = try_add(txn, target_id, cmd.quantity, now).await?;
                        }
                    }
                    if !withdrawn {
                        return Err(withdraw_rejection(
                            txn,
                            source_id,
                            cmd.agency_id,
                            cmd.quantity,
                        )
                        .await?);
                    }
                    if !added {
                        return Err(capacity_rejection(txn, target_id, cmd.quantity).await?);
                    }
                    let source_after = current_stock(txn, source_id).await?;
                    let target_after = current_stock(txn, target_id).await?;
                    record_history(
                        txn,
                        source_id,
                        HistoryKind::Transfer,
                        cmd,
                        source_after,
                        Some(target_id),
                        now,
                    )
                    .await?;
                    record_history(
                        txn,
                        target_id,
                        HistoryKind::Transfer,
                        cmd,
                        target_after,
                        Some(source_id),
                        now,
                    )
                    .await?;
                    Ok(source_after)
                })
            })
            .await
            .map_err(ServiceError::from);

        self.finish(source_id, cmd, result).await?;
        info!(%source_id, %target_id, quantity = cmd.quantity, "Transferred stock between bins");
        self.event_sender
            .send_or_log(Event::StockTransferred {
                source_bin_id: source_id,
                target_bin_id: target_id,
                agency_id: cmd.agency_id,
                sales_rep_id: cmd.sales_rep_id,
                quantity: cmd.quantity,
                at: Utc::now(),
            })
            .await;

        Ok(TransferOutcome {
            source: self.view_by_id(source_id).await?,
            target: self.view_by_id(target_id).await?,
        })
    }

    /// Publishes a rejection event for rule violations and passes the result through.
    async fn finish(
        &self,
        bin_id: Uuid,
        cmd: BinMutation,
        result: Result<i64, ServiceError>,
    ) -> Result<i64, ServiceError> {
        if let Err(err) = &result {
            if matches!(
                err,
                ServiceError::LimitExceeded { .. }
                    | ServiceError::InsufficientStock { .. }
                    | ServiceError::CapacityExceeded { .. }
            ) {
                warn!(%bin_id, agency_id = %cmd.agency_id, quantity = cmd.quantity, error = %err, "Bin mutation rejected");
                self.event_sender
                    .send_or_log(Event::MutationRejected {
                        bin_id,
                        agency_id: cmd.agency_id,
                        quantity: cmd.quantity,
                        reason: err.error_code().to_string(),
                    })
                    .await;
            }
        }
        result
    }

    /// History of one bin in insertion order, with names resolved.
    #[instrument(skip(self))]
    pub async fn history(&self, key: &str) -> Result<Vec<HistoryEntryView>, ServiceError> {
        let db = &*self.db_pool;
        let bin = self.find_bin(key).await?;
        let entries = bin_history::Entity::find()
            .filter(bin_history::Column::BinId.eq(bin.id))
            .order_by_asc(bin_history::Column::Id)
            .all(db)
            .await?;

        let agency_ids: Vec<Uuid> = entries.iter().filter_map(|e| e.agency_id).collect();
        let rep_ids: Vec<Uuid> = entries.iter().filter_map(|e| e.sales_rep_id).collect();
        let agencies = agency_names(db, Some(agency_ids)).await?;
        let reps: HashMap<Uuid, String> = if rep_ids.is_empty() {
            HashMap::new()
        } else {
            sales_rep::Entity::find()
                .filter(sales_rep::Column::Id.is_in(rep_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|r| (r.id, r.name))
                .collect()
        };

        Ok(entries
            .into_iter()
            .map(|e| HistoryEntryView {
                id: e.id,
                kind: e.kind,
                agency: e.agency_id.and_then(|id| named(id, &agencies)),
                sales_rep: e.sales_rep_id.and_then(|id| named(id, &reps)),
                quantity: e.quantity,
                stock_after: e.stock_after,
                counterpart_bin_id: e.counterpart_bin_id,
                date: e.recorded_at,
            })
            .collect())
    }

    /// Stock per agency, attributing each bin's full stock to every owner and sharer.
    #[instrument(skip(self))]
    pub async fn aggregate_by_agency(&self) -> Result<Vec<AgencyStock>, ServiceError> {
        let db = &*self.db_pool;
        let bins = inventory_bin::Entity::find()
            .order_by_asc(inventory_bin::Column::BinCode)
            .all(db)
            .await?;
        let memberships = bin_agency::Entity::find().all(db).await?;
        let names = agency_names(db, None).await?;
        Ok(aggregate(&bins, &memberships, &names))
    }
}

fn validate_quantity(quantity: i64) -> Result<(), ServiceError> {
    if quantity < 1 {
        return Err(ServiceError::ValidationError(
            "quantity must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

pub(crate) async fn resolve_bin<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> Result<inventory_bin::Model, ServiceError> {
    let found = match Uuid::parse_str(key) {
        Ok(id) => inventory_bin::Entity::find_by_id(id).one(conn).await?,
        Err(_) => {
            inventory_bin::Entity::find()
                .filter(inventory_bin::Column::BinCode.eq(key))
                .one(conn)
                .await?
        }
    };
    found.ok_or_else(|| ServiceError::bin_not_found(key))
}

async fn agency_names<C: ConnectionTrait>(
    conn: &C,
    ids: Option<Vec<Uuid>>,
) -> Result<HashMap<Uuid, String>, ServiceError> {
    let query = match ids {
        Some(ids) if ids.is_empty() => return Ok(HashMap::new()),
        Some(ids) => agency::Entity::find().filter(agency::Column::Id.is_in(ids)),
        None => agency::Entity::find(),
    };
    Ok(query
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect())
}

async fn current_stock<C: ConnectionTrait>(conn: &C, bin_id: Uuid) -> Result<i64, ServiceError> {
    inventory_bin::Entity::find_by_id(bin_id)
        .one(conn)
        .await?
        .map(|b| b.current_stock)
        .ok_or_else(|| ServiceError::bin_not_found(bin_id))
}

/// Row update order for a two-bin transaction. Every transaction touching the
/// same pair locks the rows in the same order.
fn update_order(source: Uuid, target: Uuid) -> [Uuid; 2] {
    if source <= target {
        [source, target]
    } else {
        [target, source]
    }
}

/// Conditional decrement. Applies only while the bin holds at least `quantity`
/// and the agency has no limit below it on this bin. Returns whether the row
/// changed.
///
/// Mutating transactions open with these guarded updates, so the write lock is
/// held before anything inside the transaction is read.
async fn try_withdraw<C: ConnectionTrait>(
    conn: &C,
    bin_id: Uuid,
    agency_id: Uuid,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<bool, ServiceError> {
    let over_limit = Query::select()
        .expr(Expr::val(1))
        .from(withdrawal_limit::Entity)
        .and_where(Expr::col((withdrawal_limit::Entity, withdrawal_limit::Column::BinId)).eq(bin_id))
        .and_where(
            Expr::col((withdrawal_limit::Entity, withdrawal_limit::Column::AgencyId)).eq(agency_id),
        )
        .and_where(
            Expr::col((withdrawal_limit::Entity, withdrawal_limit::Column::MaxQuantity))
                .lt(quantity),
        )
        .to_owned();

    let result = inventory_bin::Entity::update_many()
        .col_expr(
            inventory_bin::Column::CurrentStock,
            Expr::col(inventory_bin::Column::CurrentStock).sub(quantity),
        )
        .col_expr(inventory_bin::Column::LastUpdated, Expr::value(now))
        .filter(inventory_bin::Column::Id.eq(bin_id))
        .filter(inventory_bin::Column::CurrentStock.gte(quantity))
        .filter(Expr::exists(over_limit).not())
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Conditional increment bounded by the bin's capacity.
async fn try_add<C: ConnectionTrait>(
    conn: &C,
    bin_id: Uuid,
    quantity: i64,
    now: DateTime<Utc>,
) -> Result<bool, ServiceError> {
    let result = inventory_bin::Entity::update_many()
        .col_expr(
            inventory_bin::Column::CurrentStock,
            Expr::col(inventory_bin::Column::CurrentStock).add(quantity),
        )
        .col_expr(inventory_bin::Column::LastUpdated, Expr::value(now))
        .filter(inventory_bin::Column::Id.eq(bin_id))
        .filter(
            Expr::col(inventory_bin::Column::CurrentStock)
                .lte(Expr::col(inventory_bin::Column::Capacity).sub(quantity)),
        )
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// The rule a refused withdrawal broke. The agency limit takes precedence.
async fn withdraw_rejection<C: ConnectionTrait>(
    conn: &C,
    bin_id: Uuid,
    agency_id: Uuid,
    quantity: i64,
) -> Result<ServiceError, ServiceError> {
    let limit = withdrawal_limit::Entity::find()
        .filter(withdrawal_limit::Column::BinId.eq(bin_id))
        .filter(withdrawal_limit::Column::AgencyId.eq(agency_id))
        .one(conn)
        .await?;
    if let Some(limit) = limit.filter(|l| quantity > l.max_quantity) {
        return Ok(ServiceError::LimitExceeded {
            requested: quantity,
            limit: limit.max_quantity,
        });
    }
    Ok(ServiceError::InsufficientStock {
        requested: quantity,
        available: current_stock(conn, bin_id).await?,
    })
}

async fn capacity_rejection<C: ConnectionTrait>(
    conn: &C,
    bin_id: Uuid,
    quantity: i64,
) -> Result<ServiceError, ServiceError> {
    let bin = inventory_bin::Entity::find_by_id(bin_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::bin_not_found(bin_id))?;
    Ok(ServiceError::CapacityExceeded {
        requested: quantity,
        current: bin.current_stock,
        capacity: bin.capacity,
    })
}

async fn record_history<C: ConnectionTrait>(
    conn: &C,
    bin_id: Uuid,
    kind: HistoryKind,
    cmd: BinMutation,
    stock_after: i64,
    counterpart_bin_id: Option<Uuid>,
    at: DateTime<Utc>,
) -> Result<bin_history::Model, ServiceError> {
    let entry = bin_history::ActiveModel {
        bin_id: Set(bin_id),
        kind: Set(kind),
        agency_id: Set(Some(cmd.agency_id)),
        sales_rep_id: Set(Some(cmd.sales_rep_id)),
        quantity: Set(cmd.quantity),
        stock_after: Set(stock_after),
        counterpart_bin_id: Set(counterpart_bin_id),
        recorded_at: Set(at),
        ..Default::default()
    };
    Ok(entry.insert(conn).await?)
}

fn named(id: Uuid, names: &HashMap<Uuid, String>) -> Option<NamedRef> {
    names.get(&id).map(|name| NamedRef {
        id,
        name: name.clone(),
    })
}

fn assemble_view(
    bin: inventory_bin::Model,
    memberships: &[bin_agency::Model],
    limits: &[withdrawal_limit::Model],
    names: &HashMap<Uuid, String>,
) -> BinView {
    let members_with = |role: BinRole| -> Vec<NamedRef> {
        memberships
            .iter()
            .filter(|m| m.bin_id == bin.id && m.role == role)
            .filter_map(|m| named(m.agency_id, names))
            .collect()
    };
    let owners = members_with(BinRole::Owner);
    let sharers = members_with(BinRole::Sharer);
    let withdrawal_limits = limits
        .iter()
        .filter(|l| l.bin_id == bin.id)
        .filter_map(|l| {
            named(l.agency_id, names).map(|agency| WithdrawalLimitView {
                agency,
                limit: l.max_quantity,
            })
        })
        .collect();

    BinView {
        id: bin.id,
        bin_id: bin.bin_code,
        name: bin.name,
        capacity: bin.capacity,
        current_stock: bin.current_stock,
        seed_type: bin.seed_type,
        last_updated: bin.last_updated,
        owners,
        sharers,
        withdrawal_limits,
    }
}

/// Groups bins by participating agency. Agencies appear in order of first
/// appearance (bins in the given order, owners before sharers), and an agency
/// holding both roles on one bin counts that bin once.
pub fn aggregate(
    bins: &[inventory_bin::Model],
    memberships: &[bin_agency::Model],
    names: &HashMap<Uuid, String>,
) -> Vec<AgencyStock> {
    let mut result: Vec<AgencyStock> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for bin in bins {
        let mut seen = HashSet::new();
        let participants = [BinRole::Owner, BinRole::Sharer].into_iter().flat_map(|role| {
            memberships
                .iter()
                .filter(move |m| m.bin_id == bin.id && m.role == role)
                .map(|m| m.agency_id)
        });

        for agency_id in participants {
            if !seen.insert(agency_id) {
                continue;
            }
            let slot = *index.entry(agency_id).or_insert_with(|| {
                result.push(AgencyStock {
                    agency_id,
                    agency: names
                        .get(&agency_id)
                        .cloned()
                        .unwrap_or_else(|| agency_id.to_string()),
                    total: 0,
                    bins: Vec::new(),
                });
                result.len() - 1
            });
            let entry = &mut result[slot];
            entry.total += bin.current_stock;
            entry.bins.push(AgencyBinStock {
                bin: bin.name.clone(),
                bin_id: bin.bin_code.clone(),
                stock: bin.current_stock,
            });
        }
    }

    result
}
