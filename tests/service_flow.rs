//! End-to-end flow through the public API: create → start (detached) →
//! observe progress → stop → resume → terminal, with the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use payout_engine::payout::{
    ExecutorConfig, MemoryPayoutStore, NewPayout, PayoutError, PayoutExecutor, PayoutService,
    PayoutStatus, SimulatedBank,
};

fn build_service(concurrency: usize) -> (Arc<MemoryPayoutStore>, PayoutService) {
    let store = Arc::new(MemoryPayoutStore::new());
    let bank = Arc::new(SimulatedBank::with_seed(99).with_latency(1..3));
    let executor = Arc::new(PayoutExecutor::new(
        store.clone(),
        bank,
        ExecutorConfig {
            concurrency,
            chunk_size: 25,
        },
    ));
    (store.clone(), PayoutService::new(store, executor))
}

fn items(count: usize) -> Vec<NewPayout> {
    (0..count)
        .map(|i| NewPayout {
            vendor_id: format!("vendor_{:05}", i),
            vendor_name: Some(format!("Vendor {}", i)),
            amount: Decimal::new(25_000 + i as i64, 2),
            currency: "IDR".to_string(),
            bank_account: format!("ID{:012}", i),
            bank_name: Some("BCA".to_string()),
            transaction_ids: vec![format!("txn_{}", i)],
        })
        .collect()
}

/// Poll batch status until terminal or the deadline passes
async fn wait_for_terminal(
    service: &PayoutService,
    batch_id: payout_engine::BatchId,
    deadline: Duration,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        let summary = service.batch_status(batch_id).await.unwrap();
        if summary.batch.status.is_terminal() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_full_lifecycle_via_service() {
    let (_store, service) = build_service(5);

    let batch = service.create_batch(items(40)).await.unwrap();
    assert_eq!(batch.total_count, 40);

    service.start_batch(batch.id).await.unwrap();
    assert!(
        wait_for_terminal(&service, batch.id, Duration::from_secs(10)).await,
        "batch did not reach a terminal status in time"
    );

    let summary = service.batch_status(batch.id).await.unwrap();
    assert_eq!(
        summary.statistics.completed + summary.statistics.failed,
        40
    );
    assert_eq!(summary.statistics.pending, 0);
    assert_eq!(summary.statistics.processing, 0);
    assert_eq!(summary.statistics.completion_rate_percent, 100.0);

    // Counter projection caught up at termination
    assert_eq!(
        summary.batch.completed_count + summary.batch.failed_count,
        40
    );

    // Listing agrees with the statistics
    let completed_page = service
        .list_payouts(batch.id, Some(PayoutStatus::Completed), 1, 200)
        .await
        .unwrap();
    assert_eq!(completed_page.total_count, summary.statistics.completed);
}

#[tokio::test]
async fn test_stop_start_via_service() {
    let (_store, service) = build_service(3);

    let batch = service.create_batch(items(200)).await.unwrap();
    service.start_batch(batch.id).await.unwrap();

    // A second start while busy is a conflict
    tokio::time::sleep(Duration::from_millis(10)).await;
    if service.is_processing() {
        let err = service.start_batch(batch.id).await.unwrap_err();
        assert!(matches!(err, PayoutError::ProcessorBusy));
    }

    service.stop();

    // Wait for the executor to actually pause
    let start = std::time::Instant::now();
    while service.is_processing() && start.elapsed() < Duration::from_secs(10) {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!service.is_processing());

    // Resume and run to termination
    service.start_batch(batch.id).await.unwrap();
    assert!(
        wait_for_terminal(&service, batch.id, Duration::from_secs(20)).await,
        "resumed batch did not finish"
    );

    let summary = service.batch_status(batch.id).await.unwrap();
    assert_eq!(
        summary.statistics.completed + summary.statistics.failed,
        200
    );
}
