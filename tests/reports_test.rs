mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use serde_json::json;

async fn record(app: &TestApp, bin: &str, action: &str, agency: &str, rep: &str, qty: i64) {
    let agency_id = app.agency_id(agency).await;
    let sr_id = app.sales_rep_id(rep).await;
    let (status, body) = app
        .post(
            &format!("/api/inventory/bins/{}/{}", bin, action),
            json!({ "quantity": qty, "agencyId": agency_id, "srId": sr_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

async fn with_activity() -> TestApp {
    let app = TestApp::new().await;
    record(&app, "BIN-001", "withdraw", "Franklin Sisters Inc", "Mike Wilson", 200).await;
    record(&app, "BIN-003", "withdraw", "Franklin Sisters Inc", "Mike Wilson", 50).await;
    record(&app, "BIN-001", "add", "Franklin Sisters Inc", "Mike Wilson", 30).await;
    record(&app, "BIN-004", "withdraw", "Wyckoff Agency", "Lisa Brown", 120).await;
    app
}

#[tokio::test]
async fn report_is_empty_without_history() {
    let app = TestApp::new().await;
    let (status, report) = app.get("/api/reports/sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["rows"], json!([]));
    assert_eq!(report["totals"]["rowCount"], 0);
    assert_eq!(report["totals"]["withdrawals"], 0);
}

#[tokio::test]
async fn report_groups_history_per_rep_and_day() {
    let app = with_activity().await;
    let (status, report) = app.get("/api/reports/sales").await;
    assert_eq!(status, StatusCode::OK);

    let rows = report["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let lisa = &rows[0];
    assert_eq!(lisa["srName"], "Lisa Brown");
    assert_eq!(lisa["agencyName"], "Wyckoff Agency");
    assert_eq!(lisa["plan"], "basic");
    assert_eq!(lisa["withdrawals"], 120);
    assert_eq!(lisa["returns"], 0);
    assert_eq!(lisa["date"], Utc::now().date_naive().to_string());

    let mike = &rows[1];
    assert_eq!(mike["srName"], "Mike Wilson");
    assert_eq!(mike["withdrawals"], 250);
    assert_eq!(mike["returns"], 30);
    assert_eq!(mike["netInventory"], 220);

    assert_eq!(report["totals"]["withdrawals"], 370);
    assert_eq!(report["totals"]["returns"], 30);
    assert_eq!(report["totals"]["netInventory"], 340);
    assert_eq!(report["totals"]["rowCount"], 2);
}

#[tokio::test]
async fn report_filters_narrow_rows() {
    let app = with_activity().await;
    let franklin = app.agency_id("Franklin Sisters Inc").await;

    let (_, by_agency) = app
        .get(&format!("/api/reports/sales?agencyId={}", franklin))
        .await;
    assert_eq!(by_agency["rows"].as_array().unwrap().len(), 1);
    assert_eq!(by_agency["rows"][0]["srName"], "Mike Wilson");

    let (_, by_plan) = app.get("/api/reports/sales?plan=basic").await;
    assert_eq!(by_plan["rows"][0]["srName"], "Lisa Brown");

    let (_, by_search) = app.get("/api/reports/sales?search=WYCK").await;
    assert_eq!(by_search["totals"]["rowCount"], 1);

    let tomorrow = Utc::now().date_naive() + Duration::days(1);
    let (_, future) = app
        .get(&format!("/api/reports/sales?startDate={}", tomorrow))
        .await;
    assert_eq!(future["totals"]["rowCount"], 0);
}

#[tokio::test]
async fn inverted_date_range_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/api/reports/sales?startDate=2024-05-10&endDate=2024-05-01")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn csv_export_selects_columns() {
    let app = with_activity().await;
    let response = app
        .request(
            Method::GET,
            "/api/reports/sales/export?fields=srName,withdrawals,netInventory",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let expected = format!(
        "attachment; filename=\"sales-report-{}.csv\"",
        Utc::now().date_naive().format("%Y-%m-%d")
    );
    assert_eq!(headers[header::CONTENT_DISPOSITION], expected.as_str());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Sales Rep Name,Withdrawals,Net Inventory",
            "Lisa Brown,120,120",
            "Mike Wilson,250,220",
        ]
    );
}

#[tokio::test]
async fn csv_export_defaults_to_every_column() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/reports/sales/export", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap().trim_end(),
        "Sales Rep Name,Agency Name,Date,Withdrawals,Returns,Net Inventory,Plan,Status"
    );
}

#[tokio::test]
async fn csv_export_rejects_unknown_fields() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/reports/sales/export?fields=srName,bogus", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Unknown report field: bogus");
}
