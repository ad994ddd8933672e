mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn agencies_are_listed_by_name() {
    let app = TestApp::new().await;
    let (status, agencies) = app.get("/api/agencies").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = agencies
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "Franklin Sisters Inc",
            "Green Valley Seeds",
            "Harvest Partners",
            "Wyckoff Agency"
        ]
    );
    assert_eq!(agencies[0]["allocation"], 1200);
    assert_eq!(agencies[0]["status"], "active");
}

#[tokio::test]
async fn agency_lifecycle() {
    let app = TestApp::empty().await;

    let (status, created) = app
        .post(
            "/api/agencies",
            json!({ "name": "  Prairie Co-op ", "allocation": 250, "email": "ops@prairie.coop" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Prairie Co-op");
    assert_eq!(created["status"], "active");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/api/agencies/{}", id),
            Some(json!({ "allocation": 400, "status": "inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["allocation"], 400);
    assert_eq!(updated["status"], "inactive");
    assert_eq!(updated["email"], "ops@prairie.coop");

    let response = app
        .request(Method::DELETE, &format!("/api/agencies/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/agencies/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn agency_input_is_validated() {
    let app = TestApp::empty().await;

    for body in [
        json!({ "name": "", "allocation": 10 }),
        json!({ "name": "Neg", "allocation": -1 }),
        json!({ "name": "Mail", "allocation": 1, "email": "not-an-email" }),
        json!({ "allocation": 1 }),
    ] {
        let (status, err) = app.post("/api/agencies", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(err["code"], "validation_error");
    }

    let (_, agencies) = app.get("/api/agencies").await;
    assert_eq!(agencies.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn agency_attached_to_a_bin_cannot_be_deleted() {
    let app = TestApp::new().await;
    let id = app.agency_id("Wyckoff Agency").await;

    let response = app
        .request(Method::DELETE, &format!("/api/agencies/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (status, _) = app.get(&format!("/api/agencies/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sales_reps_filter_by_agency() {
    let app = TestApp::new().await;
    let (status, reps) = app.get("/api/sales-reps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reps.as_array().unwrap().len(), 4);

    let franklin = app.agency_id("Franklin Sisters Inc").await;
    let (_, filtered) = app
        .get(&format!("/api/sales-reps?agencyId={}", franklin))
        .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Mike Wilson");
    assert_eq!(filtered[0]["plan"], "premium");
    assert_eq!(filtered[0]["withdrawalLimit"], 500);
}

#[tokio::test]
async fn sales_rep_lifecycle() {
    let app = TestApp::new().await;
    let harvest = app.agency_id("Harvest Partners").await;

    let (status, created) = app
        .post(
            "/api/sales-reps",
            json!({ "name": "Tom Reed", "agencyId": harvest, "withdrawalLimit": 250, "plan": "enterprise" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["agencyId"], json!(harvest));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .json(
            Method::PUT,
            &format!("/api/sales-reps/{}", id),
            Some(json!({ "plan": "basic", "phone": "5550001" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["plan"], "basic");
    assert_eq!(updated["phone"], "5550001");
    assert_eq!(updated["withdrawalLimit"], 250);

    let response = app
        .request(Method::DELETE, &format!("/api/sales-reps/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/sales-reps/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sales_rep_requires_a_known_agency_and_plan() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/sales-reps",
            json!({ "name": "Ghost", "agencyId": Uuid::new_v4(), "plan": "basic" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Unknown agency"));

    let (status, body) = app
        .post("/api/sales-reps", json!({ "name": "Planless", "plan": "gold" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn deleting_a_sales_rep_removes_their_contracts() {
    let app = TestApp::new().await;
    let mike = app.sales_rep_id("Mike Wilson").await;

    let (_, before) = app.get(&format!("/api/contracts?srId={}", mike)).await;
    assert_eq!(before.as_array().unwrap().len(), 1);

    let response = app
        .request(Method::DELETE, &format!("/api/sales-reps/{}", mike), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (_, after) = app.get("/api/contracts").await;
    let after = after.as_array().unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["srName"], "Lisa Brown");
}
