//! 集成测试共用的假实现
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use shipment_tracking::error::{BrowserError, DispatchError, ScrapeError, StoreError};
use shipment_tracking::models::{
    Receiver, ScrapeResult, Shipment, ShipmentBinding, ShipmentId, ShipmentStatus,
};
use shipment_tracking::orchestrator::JobSettings;
use shipment_tracking::services::{
    DeliveryDispatcher, OrderCompletion, ShipmentNotifier, SkipReportWriter, TrackingSession,
    TrackingSessionFactory,
};
use shipment_tracking::store::{ChunkCommit, StatusCommit};
use shipment_tracking::{InMemoryShipmentStore, ShipmentStore, TrackingJob};

/// 假页面对某个运单号的响应
#[derive(Debug, Clone)]
pub enum Page {
    Status(&'static str),
    Timeout,
    NoRows,
    /// 抓取时 panic
    Panic,
}

/// 按运单号返回预设结果的追踪会话工厂
#[derive(Default)]
pub struct FakeTracking {
    pages: HashMap<String, Page>,
    pub scraped: Arc<Mutex<Vec<String>>>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub fail_open: bool,
    /// 设置后，每次抓取先通知 `started` 再等待 `release`
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeTracking {
    pub fn with_pages(pages: impl IntoIterator<Item = (i64, Page)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(id, page)| (tracking_number(id), page))
                .collect(),
            ..Default::default()
        }
    }

    /// 打开会话总是失败
    pub fn with_fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// 每次抓取先通知 `started`，再等待 `release`
    pub fn with_gate(mut self, started: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((started, release));
        self
    }

    pub fn scraped_ids(&self) -> Vec<String> {
        self.scraped.lock().unwrap().clone()
    }
}

struct FakeSession {
    pages: HashMap<String, Page>,
    scraped: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

#[async_trait]
impl TrackingSession for FakeSession {
    async fn fetch_raw_status(&self, tracking_number: &str) -> Result<ScrapeResult, ScrapeError> {
        self.scraped.lock().unwrap().push(tracking_number.to_string());
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        match self.pages.get(tracking_number) {
            Some(Page::Status(text)) => Ok(ScrapeResult::new(*text)),
            Some(Page::Timeout) => Err(ScrapeError::Timeout {
                tracking_number: tracking_number.to_string(),
                timeout_secs: 20,
            }),
            Some(Page::Panic) => panic!("页面脚本崩溃: {}", tracking_number),
            Some(Page::NoRows) | None => Err(ScrapeError::SelectorNotFound {
                tracking_number: tracking_number.to_string(),
                selector: "#statusDetail tr".to_string(),
            }),
        }
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TrackingSessionFactory for FakeTracking {
    async fn open(&self) -> Result<Box<dyn TrackingSession>, BrowserError> {
        if self.fail_open {
            return Err(BrowserError::ConfigurationFailed(
                "找不到浏览器可执行文件".to_string(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            scraped: self.scraped.clone(),
            closed: self.closed.clone(),
            gate: self.gate.clone(),
        }))
    }
}

/// 记录调用的订单服务
#[derive(Default)]
pub struct RecordingOrders {
    pub completed: Mutex<Vec<i64>>,
}

#[async_trait]
impl OrderCompletion for RecordingOrders {
    async fn complete_order(&self, order_id: i64) -> Result<(), DispatchError> {
        self.completed.lock().unwrap().push(order_id);
        Ok(())
    }
}

/// 记录调用的通知服务
#[derive(Default)]
pub struct RecordingNotifier {
    pub notified: Mutex<Vec<i64>>,
}

#[async_trait]
impl ShipmentNotifier for RecordingNotifier {
    async fn notify_shipment_completed(&self, order_id: i64) -> Result<(), DispatchError> {
        self.notified.lock().unwrap().push(order_id);
        Ok(())
    }
}

/// 第 `fail_on` 次分块提交失败的存储，其余调用转给内存存储
pub struct FailingCommitStore {
    inner: Arc<InMemoryShipmentStore>,
    fail_on: usize,
    commits: AtomicUsize,
}

impl FailingCommitStore {
    pub fn new(inner: Arc<InMemoryShipmentStore>, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            commits: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ShipmentStore for FailingCommitStore {
    async fn insert(&self, shipment: Shipment) -> Result<(), StoreError> {
        self.inner.insert(shipment).await
    }

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_status_after(
        &self,
        statuses: &[ShipmentStatus],
        after: Option<ShipmentId>,
        limit: usize,
    ) -> Result<Vec<Shipment>, StoreError> {
        self.inner.find_by_status_after(statuses, after, limit).await
    }

    async fn save(&self, shipment: &Shipment, read_version: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.save(shipment, read_version).await
    }

    async fn commit_chunk(&self, commits: &[StatusCommit]) -> Result<ChunkCommit, StoreError> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(StoreError::Backend("数据库连接断开".to_string()));
        }
        self.inner.commit_chunk(commits).await
    }
}

pub fn tracking_number(id: i64) -> String {
    format!("{:012}", 600000000000_i64 + id)
}

/// 订单运单，订单号 = 100 + id
pub fn order_shipment(id: i64, status: ShipmentStatus) -> Shipment {
    Shipment::restore(
        ShipmentId(id),
        ShipmentBinding::Order {
            order_id: 100 + id,
            receiver: Receiver {
                name: "정하늘".to_string(),
                phone: "010-2222-3333".to_string(),
                address: "광주광역시 북구".to_string(),
            },
        },
        Some("CJ대한통운".to_string()),
        Some(tracking_number(id)),
        status,
        Utc::now(),
        Utc::now(),
    )
}

/// 组装好的测试环境
pub struct Harness {
    pub job: Arc<TrackingJob>,
    pub store: Arc<InMemoryShipmentStore>,
    pub tracking: Arc<FakeTracking>,
    pub orders: Arc<RecordingOrders>,
    pub notifier: Arc<RecordingNotifier>,
    pub report_dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(shipments: Vec<Shipment>, tracking: FakeTracking, settings: JobSettings) -> Self {
        Self::with_store(shipments, tracking, settings, |store| {
            store as Arc<dyn ShipmentStore>
        })
    }

    /// 任务使用 `wrap` 包装后的存储，断言仍然读内存存储
    pub fn with_store<F>(
        shipments: Vec<Shipment>,
        tracking: FakeTracking,
        settings: JobSettings,
        wrap: F,
    ) -> Self
    where
        F: FnOnce(Arc<InMemoryShipmentStore>) -> Arc<dyn ShipmentStore>,
    {
        let store = Arc::new(InMemoryShipmentStore::with_shipments(shipments));
        let tracking = Arc::new(tracking);
        let orders = Arc::new(RecordingOrders::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let report_dir = tempfile::tempdir().unwrap();
        let report_path = report_dir.path().join("skipped.txt");

        let job = Arc::new(TrackingJob::new(
            wrap(store.clone()),
            tracking.clone(),
            DeliveryDispatcher::new(orders.clone(), notifier.clone()),
            SkipReportWriter::with_path(report_path.to_string_lossy().to_string()),
            settings,
        ));

        Self {
            job,
            store,
            tracking,
            orders,
            notifier,
            report_dir,
        }
    }

    pub async fn status_of(&self, id: i64) -> ShipmentStatus {
        self.stored(id).await.status()
    }

    pub async fn stored(&self, id: i64) -> Shipment {
        self.store
            .find_by_id(ShipmentId(id))
            .await
            .unwrap()
            .unwrap()
    }

    pub fn completed_orders(&self) -> Vec<i64> {
        self.orders.completed.lock().unwrap().clone()
    }

    pub fn notified_orders(&self) -> Vec<i64> {
        self.notifier.notified.lock().unwrap().clone()
    }

    pub fn skip_report(&self) -> String {
        std::fs::read_to_string(self.report_dir.path().join("skipped.txt")).unwrap_or_default()
    }
}
