pub mod agencies;
pub mod common;
pub mod contracts;
pub mod dashboard;
pub mod inventory;
pub mod reports;
pub mod sales_reps;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    agencies::AgencyService, contracts::ContractService, dashboard::DashboardService,
    inventory::InventoryService, reports::ReportService, sales_reps::SalesRepService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub agencies: Arc<AgencyService>,
    pub sales_reps: Arc<SalesRepService>,
    pub dashboard: Arc<DashboardService>,
    pub contracts: Arc<ContractService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone())),
            agencies: Arc::new(AgencyService::new(db_pool.clone(), event_sender.clone())),
            sales_reps: Arc::new(SalesRepService::new(db_pool.clone(), event_sender.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool.clone(), event_sender.clone())),
            contracts: Arc::new(ContractService::new(db_pool.clone(), event_sender)),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}
