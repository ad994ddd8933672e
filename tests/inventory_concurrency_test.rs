mod common;

use assert_matches::assert_matches;
use common::TestApp;
use futures::future::join_all;
use seedbin_api::{errors::ServiceError, services::inventory::BinMutation};

async fn mutation(app: &TestApp, agency: &str, rep: &str, quantity: i64) -> BinMutation {
    BinMutation {
        quantity,
        agency_id: app.agency_id(agency).await,
        sales_rep_id: app.sales_rep_id(rep).await,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let app = TestApp::new().await;
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

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 500 / 60);
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_matches!(failure, ServiceError::InsufficientStock { requested: 60, .. });
    }

    assert_eq!(app.stock_of("BIN-003").await, 500 - 60 * successes as i64);
    let history = service.history("BIN-003").await.expect("history");
    assert_eq!(history.len(), successes);

    let mut after: Vec<i64> = history.iter().map(|e| e.stock_after).collect();
    after.sort_unstable();
    after.dedup();
    assert_eq!(after.len(), successes, "each withdrawal saw a distinct stock level");
    assert!(after.iter().all(|stock| *stock >= 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_stop_at_capacity() {
    let app = TestApp::new().await;
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

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
    for failure in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_matches!(failure, ServiceError::CapacityExceeded { .. });
    }
    assert_eq!(app.stock_of("BIN-003").await, 900);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposing_transfers_conserve_total_stock() {
    let app = TestApp::new().await;
    let franklin = mutation(&app, "Franklin Sisters Inc", "Mike Wilson", 50).await;
    let service = app.state.inventory_service();

    let tasks = (0..8).map(|i| {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 {
            ("BIN-001", "BIN-003")
        } else {
            ("BIN-003", "BIN-001")
        };
        tokio::spawn(async move { service.transfer_stock(from, to, franklin).await })
    });
    for joined in join_all(tasks).await {
        joined.expect("task panicked").expect("transfer within limits");
    }

    let total = app.stock_of("BIN-001").await + app.stock_of("BIN-003").await;
    assert_eq!(total, 1300);
}
