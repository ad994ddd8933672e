//! Demo data set: four agencies sharing four bins, their sales reps, two
//! contracts and an initial dashboard snapshot.

use chrono::{TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        agency, bin_agency, bin_agency::BinRole, bin_history, contract,
        contract::ContractStatus, dashboard_snapshot, inventory_bin, sales_rep,
        sales_rep::SalesPlan, withdrawal_limit, RecordStatus,
    },
    errors::ServiceError,
    services::dashboard::store_snapshot,
};

/// Counts of what a seed run inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub agencies: usize,
    pub bins: usize,
    pub sales_reps: usize,
    pub contracts: usize,
    pub snapshot_id: i32,
}

struct AgencySeed {
    name: &'static str,
    allocation: i64,
    contact: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
}

const AGENCIES: [AgencySeed; 4] = [
    AgencySeed {
        name: "Franklin Sisters Inc",
        allocation: 1200,
        contact: "Alice",
        email: "alice@franklin.com",
        phone: "1234567890",
        address: "123 Main St",
    },
    AgencySeed {
        name: "Wyckoff Agency",
        allocation: 900,
        contact: "Bob",
        email: "bob@wyckoff.com",
        phone: "2345678901",
        address: "456 Oak Ave",
    },
    AgencySeed {
        name: "Green Valley Seeds",
        allocation: 800,
        contact: "Carol",
        email: "carol@greenvalley.com",
        phone: "3456789012",
        address: "789 Pine Rd",
    },
    AgencySeed {
        name: "Harvest Partners",
        allocation: 700,
        contact: "Dave",
        email: "dave@harvest.com",
        phone: "4567890123",
        address: "321 Maple St",
    },
];

/// (code, name, capacity, stock, seed type, (owner, limit), (sharer, limit));
/// agencies are indexes into `AGENCIES`.
const BINS: [(&str, &str, i64, i64, &str, (usize, i64), (usize, i64)); 4] = [
    ("BIN-001", "Bin 1", 1000, 800, "P00622Q", (0, 700), (1, 300)),
    ("BIN-002", "Bin 2", 1200, 1100, "P00123Q", (2, 900), (3, 300)),
    ("BIN-003", "Bin 3", 900, 500, "P00999A", (0, 600), (2, 300)),
    ("BIN-004", "Bin 4", 1500, 1200, "P00888B", (1, 1000), (3, 500)),
];

/// (name, email, agency index, withdrawal limit, plan)
const SALES_REPS: [(&str, &str, usize, i64, SalesPlan); 4] = [
    ("Mike Wilson", "mike@franklin.com", 0, 500, SalesPlan::Premium),
    ("Lisa Brown", "lisa@wyckoff.com", 1, 300, SalesPlan::Basic),
    ("John Davis", "john@greenvalley.com", 2, 800, SalesPlan::Enterprise),
    ("Sarah Miller", "sarah@harvest.com", 3, 400, SalesPlan::Basic),
];

/// Deletes every row the service owns, children first.
pub async fn clear_all<C: ConnectionTrait>(conn: &C) -> Result<(), ServiceError> {
    bin_history::Entity::delete_many().exec(conn).await?;
    withdrawal_limit::Entity::delete_many().exec(conn).await?;
    bin_agency::Entity::delete_many().exec(conn).await?;
    inventory_bin::Entity::delete_many().exec(conn).await?;
    contract::Entity::delete_many().exec(conn).await?;
    sales_rep::Entity::delete_many().exec(conn).await?;
    dashboard_snapshot::Entity::delete_many().exec(conn).await?;
    agency::Entity::delete_many().exec(conn).await?;
    Ok(())
}

/// Loads the demo data in one transaction. Without `reset` an already
/// populated database is left alone and a conflict is returned.
pub async fn seed_demo_data(db: &DbPool, reset: bool) -> Result<SeedSummary, ServiceError> {
    let summary = db
        .transaction::<_, SeedSummary, ServiceError>(move |txn| {
            Box::pin(async move {
                if reset {
                    clear_all(txn).await?;
                } else if agency::Entity::find().count(txn).await? > 0 {
                    return Err(ServiceError::Conflict(
                        "Database already contains data; seed with reset to replace it"
                            .to_string(),
                    ));
                }
                insert_demo_rows(txn).await
            })
        })
        .await?;

    info!(
        agencies = summary.agencies,
        bins = summary.bins,
        sales_reps = summary.sales_reps,
        contracts = summary.contracts,
        snapshot_id = summary.snapshot_id,
        "Demo data seeded"
    );
    Ok(summary)
}

async fn insert_demo_rows(txn: &DatabaseTransaction) -> Result<SeedSummary, ServiceError> {
    let now = Utc::now();

    let mut agency_ids = Vec::with_capacity(AGENCIES.len());
    for seed in &AGENCIES {
        let model = agency::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(seed.name.to_string()),
            allocation: Set(seed.allocation),
            contact_person: Set(Some(seed.contact.to_string())),
            email: Set(Some(seed.email.to_string())),
            phone: Set(Some(seed.phone.to_string())),
            address: Set(Some(seed.address.to_string())),
            status: Set(RecordStatus::Active),
            created_at: Set(now),
            last_updated: Set(now),
        }
        .insert(txn)
        .await?;
        agency_ids.push(model.id);
    }

    for (code, name, capacity, stock, seed_type, owner, sharer) in BINS {
        let bin = inventory_bin::ActiveModel {
            id: Set(Uuid::new_v4()),
            bin_code: Set(code.to_string()),
            name: Set(name.to_string()),
            capacity: Set(capacity),
            current_stock: Set(stock),
            seed_type: Set(seed_type.to_string()),
            last_updated: Set(now),
        }
        .insert(txn)
        .await?;

        for (role, (agency_idx, limit)) in [(BinRole::Owner, owner), (BinRole::Sharer, sharer)] {
            let agency_id = agency_ids[agency_idx];
            bin_agency::ActiveModel {
                id: Set(Uuid::new_v4()),
                bin_id: Set(bin.id),
                agency_id: Set(agency_id),
                role: Set(role),
            }
            .insert(txn)
            .await?;
            withdrawal_limit::ActiveModel {
                id: Set(Uuid::new_v4()),
                bin_id: Set(bin.id),
                agency_id: Set(agency_id),
                max_quantity: Set(limit),
            }
            .insert(txn)
            .await?;
        }
    }

    let mut rep_ids = Vec::with_capacity(SALES_REPS.len());
    for (name, email, agency_idx, limit, plan) in SALES_REPS {
        let rep = sales_rep::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(Some(email.to_string())),
            phone: Set(None),
            agency_id: Set(Some(agency_ids[agency_idx])),
            withdrawal_limit: Set(limit),
            plan: Set(plan),
            status: Set(RecordStatus::Active),
            created_at: Set(now),
        }
        .insert(txn)
        .await?;
        rep_ids.push(rep.id);
    }

    let contracts = [
        (rep_ids[0], (2024, 1, 1), 15000, "daily", "within 7 days", 10, 500),
        (rep_ids[1], (2024, 2, 1), 9000, "weekly", "within 14 days", 5, 300),
    ];
    for (rep_id, (y, m, d), monthly_limit, frequency, policy, min, max) in contracts {
        let start = Utc
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .unwrap_or(now);
        let end = Utc
            .with_ymd_and_hms(y, 12, 31, 0, 0, 0)
            .single()
            .unwrap_or(now);
        contract::ActiveModel {
            id: Set(Uuid::new_v4()),
            sales_rep_id: Set(rep_id),
            start_date: Set(start),
            end_date: Set(end),
            monthly_limit: Set(monthly_limit),
            status: Set(ContractStatus::Active),
            withdrawal_frequency: Set(frequency.to_string()),
            return_policy: Set(policy.to_string()),
            minimum_order: Set(min),
            maximum_order: Set(max),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;
    }

    let snapshot = store_snapshot(txn).await?;

    Ok(SeedSummary {
        agencies: agency_ids.len(),
        bins: BINS.len(),
        sales_reps: rep_ids.len(),
        contracts: contracts.len(),
        snapshot_id: snapshot.id,
    })
}
