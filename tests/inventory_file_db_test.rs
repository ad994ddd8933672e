//! Contention on a file-backed SQLite database with the default pool size,
//! where each concurrent mutation runs on its own connection.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::TestApp;
use futures::future::join_all;
use seedbin_api::{errors::ServiceError, services::inventory::BinMutation};
use serde_json::json;

async fn mutation(app: &TestApp, agency: &str, rep: &str, quantity: i64) -> BinMutation {
    BinMutation {
        quantity,
        agency_id: app.agency_id(agency).await,
        sales_rep_id: app.sales_rep_id(rep).await,
    }
}

fn assert_no_database_errors<T>(results: &[Result<T, ServiceError>]) {
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            !matches!(err, ServiceError::DatabaseError(_)),
            "mutation failed on the database: {:?}",
            err
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_withdrawals_only_fail_on_stock() {
    let app = TestApp::file_backed().await;
    // BIN-003 holds 500; Franklin may take up to 600 per withdrawal.
    let cmd = mutation(&app, "Franklin Sisters Inc", "Mike Wilson", 60).await;
    let service = app.state.inventory_service();

    let tasks = (0..12).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.withdraw_stock("BIN-003", cmd).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_no_database_errors(&results);
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 500 / 60);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ServiceError::InsufficientStock { requested: 60, .. })));

    assert_eq!(app.stock_of("BIN-003").await, 500 - 60 * 8);
    let history = service.history("BIN-003").await.expect("history");
    assert_eq!(history.len(), successes);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn limit_violations_under_contention_are_rule_errors() {
    let app = TestApp::file_backed().await;
    // Wyckoff may take at most 300 per withdrawal from BIN-001 (stock 800).
    let within = mutation(&app, "Wyckoff Agency", "Lisa Brown", 100).await;
    let over = BinMutation {
        quantity: 301,
        ..within
    };
    let service = app.state.inventory_service();

    let tasks = (0..12).map(|i| {
        let service = service.clone();
        let cmd = if i % 2 == 0 { within } else { over };
        tokio::spawn(async move { (cmd.quantity, service.withdraw_stock("BIN-001", cmd).await) })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    for (quantity, result) in &results {
        match quantity {
            100 => assert!(result.is_ok(), "withdrawal of 100 failed: {:?}", result),
            _ => assert!(matches!(
                result,
                Err(ServiceError::LimitExceeded { requested: 301, limit: 300 })
            )),
        }
    }
    assert_eq!(app.stock_of("BIN-001").await, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_adds_fill_to_capacity() {
    let app = TestApp::file_backed().await;
    // BIN-003: capacity 900, stock 500.
    let cmd = mutation(&app, "Franklin Sisters Inc", "Mike Wilson", 100).await;
    let service = app.state.inventory_service();

    let tasks = (0..10).map(|_| {
        let service = service.clone();
        tokio::spawn(async move { service.add_stock("BIN-003", cmd).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_no_database_errors(&results);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
    assert_eq!(app.stock_of("BIN-003").await, 900);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn opposing_transfers_all_commit() {
    let app = TestApp::file_backed().await;
    let cmd = mutation(&app, "Franklin Sisters Inc", "Mike Wilson", 50).await;
    let service = app.state.inventory_service();

    // Four each way; either bin can absorb 200 in the worst interleaving.
    let tasks = (0..8).map(|i| {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 {
            ("BIN-001", "BIN-003")
        } else {
            ("BIN-003", "BIN-001")
        };
        tokio::spawn(async move { service.transfer_stock(from, to, cmd).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_no_database_errors(&results);
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(app.stock_of("BIN-001").await, 800);
    assert_eq!(app.stock_of("BIN-003").await, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_http_withdrawals_never_return_server_errors() {
    let app = Arc::new(TestApp::file_backed().await);
    let agency_id = app.agency_id("Green Valley Seeds").await;
    let sr_id = app.sales_rep_id("John Davis").await;

    // BIN-002 holds 1100; Green Valley may take up to 900 at a time.
    let tasks = (0..10).map(|_| {
        let app = app.clone();
        tokio::spawn(async move {
            app.post(
                "/api/inventory/bins/BIN-002/withdraw",
                json!({ "quantity": 250, "agencyId": agency_id, "srId": sr_id }),
            )
            .await
        })
    });
    let responses: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let ok = responses.iter().filter(|(s, _)| *s == StatusCode::OK).count();
    assert_eq!(ok, 4);
    for (status, body) in responses.iter().filter(|(s, _)| *s != StatusCode::OK) {
        assert_eq!(*status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "insufficient_stock");
    }
    assert_eq!(app.stock_of("BIN-002").await, 100);
}
