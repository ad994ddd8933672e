//! Sales activity derived from bin history: one row per sales rep per UTC day,
//! with a CSV rendering for export.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        agency,
        bin_history::{self, HistoryKind},
        sales_rep::{self, SalesPlan},
        RecordStatus,
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SalesReportQuery {
    /// Inclusive, UTC
    pub start_date: Option<NaiveDate>,
    /// Inclusive, UTC
    pub end_date: Option<NaiveDate>,
    pub sr_id: Option<Uuid>,
    pub agency_id: Option<Uuid>,
    pub plan: Option<SalesPlan>,
    pub status: Option<RecordStatus>,
    /// Case-insensitive match on rep, agency, plan or status
    pub search: Option<String>,
    /// Comma-separated export columns, e.g. `srName,date,withdrawals`
    pub fields: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRow {
    pub sr_id: Uuid,
    pub sr_name: String,
    pub agency_id: Option<Uuid>,
    pub agency_name: Option<String>,
    pub plan: SalesPlan,
    pub status: RecordStatus,
    pub date: NaiveDate,
    pub withdrawals: i64,
    pub returns: i64,
    pub net_inventory: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportTotals {
    pub withdrawals: i64,
    pub returns: i64,
    pub net_inventory: i64,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesReport {
    pub rows: Vec<SalesReportRow>,
    pub totals: SalesReportTotals,
}

/// A selectable export column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum ReportField {
    #[strum(serialize = "srName")]
    SrName,
    #[strum(serialize = "agencyName")]
    AgencyName,
    #[strum(serialize = "date")]
    Date,
    #[strum(serialize = "withdrawals")]
    Withdrawals,
    #[strum(serialize = "returns")]
    Returns,
    #[strum(serialize = "netInventory")]
    NetInventory,
    #[strum(serialize = "plan")]
    Plan,
    #[strum(serialize = "status")]
    Status,
}

impl ReportField {
    pub fn label(&self) -> &'static str {
        match self {
            ReportField::SrName => "Sales Rep Name",
            ReportField::AgencyName => "Agency Name",
            ReportField::Date => "Date",
            ReportField::Withdrawals => "Withdrawals",
            ReportField::Returns => "Returns",
            ReportField::NetInventory => "Net Inventory",
            ReportField::Plan => "Plan",
            ReportField::Status => "Status",
        }
    }

    fn value(&self, row: &SalesReportRow) -> String {
        match self {
            ReportField::SrName => row.sr_name.clone(),
            ReportField::AgencyName => row.agency_name.clone().unwrap_or_default(),
            ReportField::Date => row.date.format("%Y-%m-%d").to_string(),
            ReportField::Withdrawals => row.withdrawals.to_string(),
            ReportField::Returns => row.returns.to_string(),
            ReportField::NetInventory => row.net_inventory.to_string(),
            ReportField::Plan => row.plan.as_str().to_string(),
            ReportField::Status => row.status.as_str().to_string(),
        }
    }
}

/// Parses a `fields` list. Blank or absent selects every column.
pub fn parse_fields(raw: Option<&str>) -> Result<Vec<ReportField>, ServiceError> {
    let names: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        return Ok(ReportField::iter().collect());
    }
    names
        .into_iter()
        .map(|name| {
            ReportField::from_str(name)
                .map_err(|_| ServiceError::ValidationError(format!("Unknown report field: {}", name)))
        })
        .collect()
}

/// Everything about a rep that ends up on a report row.
#[derive(Debug, Clone)]
pub struct RepInfo {
    pub name: String,
    pub agency_id: Option<Uuid>,
    pub agency_name: Option<String>,
    pub plan: SalesPlan,
    pub status: RecordStatus,
}

/// Folds add/withdraw history into per-rep daily rows, ordered by date then rep
/// name. Transfers and entries whose rep no longer exists are skipped.
pub fn build_rows(
    entries: &[bin_history::Model],
    reps: &HashMap<Uuid, RepInfo>,
) -> Vec<SalesReportRow> {
    let mut grouped: BTreeMap<(NaiveDate, String, Uuid), (i64, i64)> = BTreeMap::new();
    for entry in entries {
        let Some(rep_id) = entry.sales_rep_id else {
            continue;
        };
        let Some(rep) = reps.get(&rep_id) else {
            continue;
        };
        let key = (entry.recorded_at.date_naive(), rep.name.clone(), rep_id);
        let slot = grouped.entry(key).or_insert((0, 0));
        match entry.kind {
            HistoryKind::Withdraw => slot.0 += entry.quantity,
            HistoryKind::Add => slot.1 += entry.quantity,
            HistoryKind::Transfer => {}
        }
    }

    grouped
        .into_iter()
        .filter(|(_, (withdrawals, returns))| withdrawals + returns > 0)
        .filter_map(|((date, _, rep_id), (withdrawals, returns))| {
            reps.get(&rep_id).map(|rep| SalesReportRow {
                sr_id: rep_id,
                sr_name: rep.name.clone(),
                agency_id: rep.agency_id,
                agency_name: rep.agency_name.clone(),
                plan: rep.plan,
                status: rep.status,
                date,
                withdrawals,
                returns,
                net_inventory: withdrawals - returns,
            })
        })
        .collect()
}

fn matches_search(row: &SalesReportRow, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [
        row.sr_name.as_str(),
        row.agency_name.as_deref().unwrap_or_default(),
        row.plan.as_str(),
        row.status.as_str(),
    ]
    .iter()
    .any(|hay| hay.to_lowercase().contains(&needle))
}

/// Applies the non-date filters of `query`.
pub fn filter_rows(rows: Vec<SalesReportRow>, query: &SalesReportQuery) -> Vec<SalesReportRow> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    rows.into_iter()
        .filter(|r| query.sr_id.map_or(true, |id| r.sr_id == id))
        .filter(|r| query.agency_id.map_or(true, |id| r.agency_id == Some(id)))
        .filter(|r| query.plan.map_or(true, |p| r.plan == p))
        .filter(|r| query.status.map_or(true, |s| r.status == s))
        .filter(|r| search.map_or(true, |s| matches_search(r, s)))
        .collect()
}

pub fn totals(rows: &[SalesReportRow]) -> SalesReportTotals {
    rows.iter().fold(
        SalesReportTotals::default(),
        |mut acc, row| {
            acc.withdrawals += row.withdrawals;
            acc.returns += row.returns;
            acc.net_inventory += row.net_inventory;
            acc.row_count += 1;
            acc
        },
    )
}

pub fn render_csv(rows: &[SalesReportRow], fields: &[ReportField]) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields.iter().map(|f| f.label()))?;
    for row in rows {
        writer.write_record(fields.iter().map(|f| f.value(row)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

pub fn export_filename(day: NaiveDate) -> String {
    format!("sales-report-{}.csv", day.format("%Y-%m-%d"))
}

/// A rendered CSV export.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn sales_report(&self, query: &SalesReportQuery) -> Result<SalesReport, ServiceError> {
        let rows = self.load_rows(query).await?;
        let totals = totals(&rows);
        Ok(SalesReport { rows, totals })
    }

    #[instrument(skip(self))]
    pub async fn export_csv(&self, query: &SalesReportQuery) -> Result<CsvExport, ServiceError> {
        let fields = parse_fields(query.fields.as_deref())?;
        let rows = self.load_rows(query).await?;
        let body = render_csv(&rows, &fields)?;
        info!(rows = rows.len(), columns = fields.len(), "Sales report exported");
        Ok(CsvExport {
            filename: export_filename(Utc::now().date_naive()),
            body,
        })
    }

    async fn load_rows(&self, query: &SalesReportQuery) -> Result<Vec<SalesReportRow>, ServiceError> {
        let db = &*self.db_pool;
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if end < start {
                return Err(ServiceError::ValidationError(
                    "endDate must not be before startDate".to_string(),
                ));
            }
        }

        let mut history = bin_history::Entity::find()
            .filter(bin_history::Column::Kind.is_in([HistoryKind::Add, HistoryKind::Withdraw]))
            .filter(bin_history::Column::SalesRepId.is_not_null())
            .order_by_asc(bin_history::Column::Id);
        if let Some(start) = query.start_date {
            let from = Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN));
            history = history.filter(bin_history::Column::RecordedAt.gte(from));
        }
        if let Some(end) = query.end_date.and_then(|d| d.checked_add_days(Days::new(1))) {
            let to = Utc.from_utc_datetime(&end.and_time(NaiveTime::MIN));
            history = history.filter(bin_history::Column::RecordedAt.lt(to));
        }
        let entries = history.all(db).await?;

        let agencies: HashMap<Uuid, String> = agency::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let reps: HashMap<Uuid, RepInfo> = sales_rep::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|r| {
                let agency_name = r.agency_id.and_then(|id| agencies.get(&id).cloned());
                (
                    r.id,
                    RepInfo {
                        name: r.name,
                        agency_id: r.agency_id,
                        agency_name,
                        plan: r.plan,
                        status: r.status,
                    },
                )
            })
            .collect();

        Ok(filter_rows(build_rows(&entries, &reps), query))
    }
}
