use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Seed Bin Inventory API",
        version = "0.1.0",
        description = r#"
# Seed Bin Inventory API

Shared seed storage bins used by several agencies.

- **Bins**: owners and sharers see a bin's full stock; withdrawals are capped per agency and per request
- **History**: every add, withdraw and transfer is recorded with the acting agency and sales rep
- **Dashboard**: stored capacity and usage snapshots
- **Contracts** and **Sales reports** derived from bin history, with CSV export

## Errors

Every failure returns the same body:

```json
{
  "error": "Withdrawal exceeds agency limit (requested 400, limit 300)",
  "code": "limit_exceeded",
  "status": 400,
  "requestId": "9f0c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:5001", description = "Local development")
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "agencies", description = "Agency reference data"),
        (name = "sales-reps", description = "Sales representatives"),
        (name = "inventory", description = "Bins, stock movements, history and aggregates"),
        (name = "dashboard", description = "Capacity and usage snapshots"),
        (name = "contracts", description = "Sales rep contracts"),
        (name = "reports", description = "Sales reporting and CSV export")
    ),
    paths(
        crate::health::health_check,

        crate::handlers::agencies::list_agencies,
        crate::handlers::agencies::get_agency,
        crate::handlers::agencies::create_agency,
        crate::handlers::agencies::update_agency,
        crate::handlers::agencies::delete_agency,

        crate::handlers::sales_reps::list_sales_reps,
        crate::handlers::sales_reps::get_sales_rep,
        crate::handlers::sales_reps::create_sales_rep,
        crate::handlers::sales_reps::update_sales_rep,
        crate::handlers::sales_reps::delete_sales_rep,

        crate::handlers::inventory::list_bins,
        crate::handlers::inventory::get_bin,
        crate::handlers::inventory::add_stock,
        crate::handlers::inventory::withdraw_stock,
        crate::handlers::inventory::transfer_stock,
        crate::handlers::inventory::bin_history,
        crate::handlers::inventory::aggregate_by_agency,

        crate::handlers::dashboard::latest_dashboard,
        crate::handlers::dashboard::refresh_dashboard,

        crate::handlers::contracts::list_contracts,
        crate::handlers::contracts::get_contract,
        crate::handlers::contracts::create_contract,
        crate::handlers::contracts::update_contract,
        crate::handlers::contracts::delete_contract,

        crate::handlers::reports::sales_report,
        crate::handlers::reports::export_sales_report,
    ),
    components(
        schemas(
            crate::health::HealthResponse,
            crate::health::HealthStatus,
            crate::entities::RecordStatus,
            crate::entities::sales_rep::SalesPlan,
            crate::entities::contract::ContractStatus,
            crate::entities::bin_history::HistoryKind,

            crate::handlers::agencies::AgencyResponse,
            crate::services::agencies::CreateAgencyInput,
            crate::services::agencies::UpdateAgencyInput,

            crate::handlers::sales_reps::SalesRepResponse,
            crate::services::sales_reps::CreateSalesRepInput,
            crate::services::sales_reps::UpdateSalesRepInput,

            crate::handlers::inventory::BinMutationRequest,
            crate::handlers::inventory::TransferRequest,
            crate::services::inventory::BinView,
            crate::services::inventory::NamedRef,
            crate::services::inventory::WithdrawalLimitView,
            crate::services::inventory::HistoryEntryView,
            crate::services::inventory::AgencyStock,
            crate::services::inventory::AgencyBinStock,
            crate::services::inventory::TransferOutcome,

            crate::services::dashboard::DashboardView,
            crate::services::dashboard::DashboardAgency,

            crate::services::contracts::ContractView,
            crate::services::contracts::ContractTerms,
            crate::services::contracts::CreateContractInput,
            crate::services::contracts::UpdateContractInput,

            crate::services::reports::SalesReport,
            crate::services::reports::SalesReportRow,
            crate::services::reports::SalesReportTotals,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
