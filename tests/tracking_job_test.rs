mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use shipment_tracking::error::{BrowserError, ItemError, ScrapeError, StoreError};
use shipment_tracking::orchestrator::JobSettings;
use shipment_tracking::services::status_mapper::{DELIVERED_MARKER, OUT_FOR_DELIVERY_MARKER};
use shipment_tracking::{
    RunError, ShipmentId, ShipmentService, ShipmentStatus, ShipmentStore, TrackingScheduler,
};

use common::{order_shipment, tracking_number, FailingCommitStore, FakeTracking, Harness, Page};

const UNKNOWN_TEXT: &str = "간선상차";

fn settings(chunk_size: usize, skip_limit: usize) -> JobSettings {
    JobSettings {
        chunk_size,
        skip_limit,
    }
}

#[tokio::test]
async fn test_delivered_marker_completes_order_once() {
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::OutForDelivery)],
        FakeTracking::with_pages([(1, Page::Status(DELIVERED_MARKER))]),
        JobSettings::default(),
    );

    let report = assert_ok!(h.job.run().await);

    assert_eq!(h.status_of(1).await, ShipmentStatus::Delivered);
    assert_eq!(report.updated, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(h.completed_orders(), vec![101]);
    assert_eq!(h.notified_orders(), vec![101]);
}

#[tokio::test]
async fn test_out_for_delivery_marker_has_no_side_effects() {
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(1, Page::Status(OUT_FOR_DELIVERY_MARKER))]),
        JobSettings::default(),
    );

    let report = assert_ok!(h.job.run().await);

    assert_eq!(h.status_of(1).await, ShipmentStatus::OutForDelivery);
    assert_eq!(report.updated, 1);
    assert_eq!(report.delivered, 0);
    assert!(h.completed_orders().is_empty());
    assert!(h.notified_orders().is_empty());
}

#[tokio::test]
async fn test_unknown_text_keeps_in_transit_without_error() {
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(1, Page::Status(UNKNOWN_TEXT))]),
        JobSettings::default(),
    );

    let report = assert_ok!(h.job.run().await);

    assert_eq!(h.status_of(1).await, ShipmentStatus::InTransit);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 0);
    assert!(h.skip_report().is_empty());
}

#[tokio::test]
async fn test_single_timeout_is_skipped_and_rest_committed() {
    let shipments = (1..=10)
        .map(|id| order_shipment(id, ShipmentStatus::InTransit))
        .collect();
    let pages = (1..=10).map(|id| {
        if id == 5 {
            (id, Page::Timeout)
        } else {
            (id, Page::Status(OUT_FOR_DELIVERY_MARKER))
        }
    });
    let h = Harness::new(shipments, FakeTracking::with_pages(pages), settings(50, 50));

    let report = assert_ok!(h.job.run().await);

    assert_eq!(report.read, 10);
    assert_eq!(report.updated, 9);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.chunks_committed, 1);
    assert_eq!(h.status_of(5).await, ShipmentStatus::InTransit);
    for id in (1..=10).filter(|id| *id != 5) {
        assert_eq!(h.status_of(id).await, ShipmentStatus::OutForDelivery);
    }

    let skipped = h.skip_report();
    assert_eq!(skipped.lines().count(), 1);
    assert!(skipped.contains("scrape_timeout"));
    assert!(skipped.contains(&tracking_number(5)));
}

#[tokio::test]
async fn test_skip_limit_aborts_and_keeps_committed_chunks() {
    let shipments = (1..=9)
        .map(|id| order_shipment(id, ShipmentStatus::OutForDelivery))
        .collect();
    let pages = (1..=9).map(|id| match id {
        5 | 6 | 8 => (id, Page::Timeout),
        _ => (id, Page::Status(DELIVERED_MARKER)),
    });
    let h = Harness::new(shipments, FakeTracking::with_pages(pages), settings(3, 2));

    let err = assert_err!(h.job.run().await);

    match err {
        RunError::SkipLimitExceeded {
            skipped,
            limit,
            chunks_committed,
        } => {
            assert_eq!(skipped, 3);
            assert_eq!(limit, 2);
            assert_eq!(chunks_committed, 2);
        }
        other => panic!("expected SkipLimitExceeded, got {other:?}"),
    }

    for id in 1..=4 {
        assert_eq!(h.status_of(id).await, ShipmentStatus::Delivered);
    }
    // 第三块作废，7 号虽然已签收也不会提交
    assert_eq!(h.status_of(7).await, ShipmentStatus::OutForDelivery);
    assert_eq!(h.status_of(9).await, ShipmentStatus::OutForDelivery);
    assert_eq!(h.completed_orders(), vec![101, 102, 103, 104]);
    assert_eq!(h.notified_orders(), vec![101, 102, 103, 104]);

    assert!(!h.tracking.scraped_ids().contains(&tracking_number(9)));
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_illegal_transition_is_skipped_and_reported() {
    // 派送中的运单遇到未收录文字会映射为运输中，迁移表不允许
    let h = Harness::new(
        vec![
            order_shipment(1, ShipmentStatus::OutForDelivery),
            order_shipment(2, ShipmentStatus::InTransit),
        ],
        FakeTracking::with_pages([
            (1, Page::Status(UNKNOWN_TEXT)),
            (2, Page::Status(DELIVERED_MARKER)),
        ]),
        JobSettings::default(),
    );

    let report = assert_ok!(h.job.run().await);

    assert_eq!(report.skipped, 1);
    assert_eq!(h.status_of(1).await, ShipmentStatus::OutForDelivery);
    assert_eq!(h.status_of(2).await, ShipmentStatus::Delivered);
    assert!(h.skip_report().contains("transition"));
}

#[tokio::test]
async fn test_missing_tracking_number_is_skipped() {
    let mut shipment = shipment_tracking::Shipment::for_sale(ShipmentId(1), 77);
    shipment.transition_to(ShipmentStatus::Shipped).unwrap();
    shipment.transition_to(ShipmentStatus::InTransit).unwrap();
    let h = Harness::new(vec![shipment], FakeTracking::default(), JobSettings::default());

    let report = assert_ok!(h.job.run().await);

    assert_eq!(report.skipped, 1);
    assert!(h.tracking.scraped_ids().is_empty());
    assert!(h.skip_report().contains("missing_tracking_number"));
}

#[tokio::test]
async fn test_browser_failure_aborts_before_any_item() {
    let tracking =
        FakeTracking::with_pages([(1, Page::Status(DELIVERED_MARKER))]).with_fail_open();
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::OutForDelivery)],
        tracking,
        JobSettings::default(),
    );

    let err = assert_err!(h.job.run().await);

    assert!(matches!(err, RunError::Browser(BrowserError::ConfigurationFailed(_))));
    assert_eq!(h.status_of(1).await, ShipmentStatus::OutForDelivery);
    assert!(h.tracking.scraped_ids().is_empty());
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 0);
    assert!(h.skip_report().is_empty());
}

#[tokio::test]
async fn test_session_closed_once_per_run() {
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(1, Page::NoRows)]),
        JobSettings::default(),
    );

    assert_ok!(h.job.run().await);
    assert_ok!(h.job.run().await);

    assert_eq!(h.tracking.opened.load(Ordering::SeqCst), 2);
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_store_commits_nothing() {
    let h = Harness::new(
        vec![
            order_shipment(1, ShipmentStatus::Pending),
            order_shipment(2, ShipmentStatus::Delivered),
        ],
        FakeTracking::default(),
        JobSettings::default(),
    );

    let report = assert_ok!(h.job.run().await);

    assert_eq!(report.read, 0);
    assert_eq!(report.chunks_committed, 0);
    assert!(h.tracking.scraped_ids().is_empty());
}

#[tokio::test]
async fn test_overlapping_run_is_rejected() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let tracking = FakeTracking::with_pages([(1, Page::Status(OUT_FOR_DELIVERY_MARKER))])
        .with_gate(started.clone(), release.clone());
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        tracking,
        JobSettings::default(),
    );

    let job = h.job.clone();
    let first = tokio::spawn(async move { job.run().await });
    started.notified().await;

    let second = h.job.run().await;
    assert!(matches!(second, Err(RunError::AlreadyRunning)));

    release.notify_one();
    let report = assert_ok!(first.await.unwrap());
    assert_eq!(report.updated, 1);
}

#[tokio::test]
async fn test_check_now_persists_and_dispatches() {
    let h = Harness::new(
        vec![order_shipment(3, ShipmentStatus::OutForDelivery)],
        FakeTracking::with_pages([(3, Page::Status(DELIVERED_MARKER))]),
        JobSettings::default(),
    );

    let status = assert_ok!(h.job.check_now(ShipmentId(3)).await);

    assert_eq!(status, ShipmentStatus::Delivered);
    assert_eq!(h.status_of(3).await, ShipmentStatus::Delivered);
    assert_eq!(h.completed_orders(), vec![103]);
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_check_now_reports_item_errors() {
    let h = Harness::new(
        vec![order_shipment(3, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(3, Page::Timeout)]),
        JobSettings::default(),
    );

    let err = assert_err!(h.job.check_now(ShipmentId(3)).await);
    assert!(matches!(
        err,
        RunError::Item {
            id: ShipmentId(3),
            source: ItemError::Scrape(ScrapeError::Timeout { .. }),
        }
    ));

    let err = assert_err!(h.job.check_now(ShipmentId(42)).await);
    assert!(matches!(err, RunError::ShipmentNotFound(ShipmentId(42))));
}

#[tokio::test]
async fn test_scheduler_tick_swallows_failures() {
    let failing = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::default().with_fail_open(),
        JobSettings::default(),
    );
    let scheduler = TrackingScheduler::new(failing.job.clone(), Duration::from_secs(3600));
    assert!(scheduler.tick().await.is_none());

    let ok = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(1, Page::Status(OUT_FOR_DELIVERY_MARKER))]),
        JobSettings::default(),
    );
    let scheduler = TrackingScheduler::new(ok.job.clone(), Duration::from_secs(3600));
    let report = scheduler.tick().await.expect("批次应成功");
    assert_eq!(report.updated, 1);
}

#[tokio::test]
async fn test_scheduler_stops_on_shutdown() {
    let h = Harness::new(vec![], FakeTracking::default(), JobSettings::default());
    let scheduler = TrackingScheduler::new(h.job.clone(), Duration::from_millis(10));

    tokio::time::timeout(
        Duration::from_secs(5),
        scheduler.run_until(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("调度器应在收到停止信号后退出");

    assert!(h.tracking.opened.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_manual_correction_during_run_is_kept() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let tracking = FakeTracking::with_pages([(1, Page::Status(OUT_FOR_DELIVERY_MARKER))])
        .with_gate(started.clone(), release.clone());
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        tracking,
        JobSettings::default(),
    );

    let job = h.job.clone();
    let run = tokio::spawn(async move { job.run().await });
    started.notified().await;

    // 批次抓取旧运单号期间，管理端更正了运单号
    let service = ShipmentService::new(h.store.clone());
    assert_ok!(
        service
            .update_tracking_info(ShipmentId(1), "CJ대한통운", "9999-8888-7777")
            .await
    );
    release.notify_one();

    let report = assert_ok!(run.await.unwrap());
    assert_eq!(report.updated, 0);
    assert_eq!(report.stale, 1);

    let stored = h.stored(1).await;
    assert_eq!(stored.tracking_number(), Some("999988887777"));
    assert_eq!(stored.status(), ShipmentStatus::InTransit);
}

#[tokio::test]
async fn test_check_now_reports_conflict_when_changed_meanwhile() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let tracking = FakeTracking::with_pages([(1, Page::Status(DELIVERED_MARKER))])
        .with_gate(started.clone(), release.clone());
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        tracking,
        JobSettings::default(),
    );

    let job = h.job.clone();
    let check = tokio::spawn(async move { job.check_now(ShipmentId(1)).await });
    started.notified().await;

    let service = ShipmentService::new(h.store.clone());
    assert_ok!(
        service
            .update_tracking_info(ShipmentId(1), "CJ대한통운", "999988887777")
            .await
    );
    release.notify_one();

    let err = assert_err!(check.await.unwrap());
    assert!(matches!(
        err,
        RunError::Store(StoreError::Conflict(ShipmentId(1)))
    ));
    assert_eq!(h.status_of(1).await, ShipmentStatus::InTransit);
    assert!(h.completed_orders().is_empty());
}

#[tokio::test]
async fn test_store_failure_keeps_earlier_chunks_and_closes_session() {
    let shipments = (1..=4)
        .map(|id| order_shipment(id, ShipmentStatus::InTransit))
        .collect();
    let pages = (1..=4).map(|id| (id, Page::Status(OUT_FOR_DELIVERY_MARKER)));
    let h = Harness::with_store(
        shipments,
        FakeTracking::with_pages(pages),
        settings(2, 50),
        |store| Arc::new(FailingCommitStore::new(store, 2)) as Arc<dyn ShipmentStore>,
    );

    let err = assert_err!(h.job.run().await);

    assert!(matches!(err, RunError::Store(StoreError::Backend(_))));
    assert_eq!(h.status_of(1).await, ShipmentStatus::OutForDelivery);
    assert_eq!(h.status_of(2).await, ShipmentStatus::OutForDelivery);
    assert_eq!(h.status_of(3).await, ShipmentStatus::InTransit);
    assert_eq!(h.status_of(4).await, ShipmentStatus::InTransit);
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panic_during_run_still_closes_session() {
    let h = Harness::new(
        vec![order_shipment(1, ShipmentStatus::InTransit)],
        FakeTracking::with_pages([(1, Page::Panic)]),
        JobSettings::default(),
    );

    let job = h.job.clone();
    let err = tokio::spawn(async move { job.run().await })
        .await
        .unwrap_err();

    assert!(err.is_panic());
    assert_eq!(h.tracking.closed.load(Ordering::SeqCst), 1);
    assert_eq!(h.status_of(1).await, ShipmentStatus::InTransit);

    // panic 之后运行锁已释放
    let next = tokio::time::timeout(Duration::from_secs(5), h.job.check_now(ShipmentId(99)))
        .await
        .expect("运行锁应已释放");
    assert!(matches!(next, Err(RunError::ShipmentNotFound(ShipmentId(99)))));
}
