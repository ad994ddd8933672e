mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn seeded_dashboard_reports_totals() {
    let app = TestApp::new().await;
    let (status, dashboard) = app.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(dashboard["totalCapacity"], 4600);
    assert_eq!(dashboard["currentUsage"], 3600);
    let agencies = dashboard["agencies"].as_array().unwrap();
    assert_eq!(agencies.len(), 4);
    assert_eq!(agencies[0]["name"], "Franklin Sisters Inc");
    assert_eq!(agencies[0]["allocation"], 1200);
    assert!(agencies[0]["lastUpdated"].is_string());
}

#[tokio::test]
async fn refresh_stores_a_new_snapshot() {
    let app = TestApp::new().await;
    let (_, before) = app.get("/api/dashboard").await;

    let agency_id = app.agency_id("Harvest Partners").await;
    let sr_id = app.sales_rep_id("Sarah Miller").await;
    let (status, _) = app
        .post(
            "/api/inventory/bins/BIN-004/withdraw",
            json!({ "quantity": 400, "agencyId": agency_id, "srId": sr_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Snapshots are not live.
    let (_, stale) = app.get("/api/dashboard").await;
    assert_eq!(stale["currentUsage"], 3600);

    let (status, refreshed) = app.post("/api/dashboard/refresh", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["currentUsage"], 3200);
    assert!(refreshed["id"].as_i64().unwrap() > before["id"].as_i64().unwrap());

    let (_, latest) = app.get("/api/dashboard").await;
    assert_eq!(latest["id"], refreshed["id"]);
}

#[tokio::test]
async fn empty_database_has_no_dashboard() {
    let app = TestApp::empty().await;
    let (status, body) = app.get("/api/dashboard").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No dashboard data found");

    let (status, refreshed) = app.post("/api/dashboard/refresh", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["totalCapacity"], 0);
    assert_eq!(refreshed["agencies"], json!([]));
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::empty().await;
    let (status, health) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "OK");
    assert_eq!(health["message"], "Server is running");
    assert_eq!(health["database"], "up");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::empty().await;
    let response = app
        .request(Method::GET, "/api/health", None)
        .await;
    assert!(response.headers().contains_key("x-request-id"));

    let request = axum::http::Request::builder()
        .uri("/api/health")
        .header("x-request-id", "client-abc-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.headers()["x-request-id"], "client-abc-123");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let app = TestApp::empty().await;
    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    assert_eq!(body["error"], "Route not found: /api/nothing-here");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::empty().await;
    let (status, doc) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Seed Bin Inventory API");
    assert!(doc["paths"]["/api/inventory/bins/{id}/withdraw"].is_object());
}

#[tokio::test]
async fn reseeding_a_populated_database_conflicts() {
    let app = TestApp::new().await;
    let err = seedbin_api::seed::seed_demo_data(&app.state.db, false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "conflict");

    let summary = seedbin_api::seed::seed_demo_data(&app.state.db, true)
        .await
        .expect("reset seed");
    assert_eq!(summary.bins, 4);
    assert_eq!(app.stock_of("BIN-001").await, 800);
}
