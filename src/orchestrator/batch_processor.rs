//! 运单对账批处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是定时任务的入口，负责一次对账批次的资源管理和分块调度。
//!
//! ## 核心功能
//!
//! 1. **互斥运行**：同一时间只允许一个批次
//! 2. **资源管理**：批次开始时打开浏览器会话，任何路径退出都会关闭
//! 3. **分块读取**：按 ID 游标分页读取待追踪运单
//! 4. **跳过策略**：单个运单失败不影响其他运单，跳过数超限时中止
//! 5. **分块提交**：每块作为一个整体写入，读取后被修改过的运单放弃提交，提交后再分发签收副作用
//! 6. **按需查询**：单个运单的同步对账

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{RunError, RunResult, StoreError};
use crate::models::{Shipment, ShipmentId, ShipmentStatus};
use crate::orchestrator::chunk_processor::{self, SkipCounter};
use crate::services::tracking_scraper::{TrackingSession, TrackingSessionFactory};
use crate::services::{DeliveryDispatcher, SkipReportWriter};
use crate::store::{ChunkCommit, ShipmentStore, StatusCommit};
use crate::utils::logging::{log_chunk_committed, log_chunk_start, print_final_stats};
use crate::workflow::{ItemOutcome, ShipmentCtx, TrackingFlow};

/// 批次参数
#[derive(Debug, Clone, Copy)]
pub struct JobSettings {
    pub chunk_size: usize,
    pub skip_limit: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            skip_limit: 50,
        }
    }
}

/// 批次统计
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// 读取的运单数
    pub read: usize,
    /// 已提交的状态迁移数
    pub updated: usize,
    pub unchanged: usize,
    /// 已提交的签收数
    pub delivered: usize,
    pub skipped: usize,
    /// 批次期间被其他操作修改、放弃提交的运单数
    pub stale: usize,
    pub chunks_committed: usize,
}

impl RunReport {
    fn new(run_id: String) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            read: 0,
            updated: 0,
            unchanged: 0,
            delivered: 0,
            skipped: 0,
            stale: 0,
            chunks_committed: 0,
        }
    }
}

/// 运单对账任务
pub struct TrackingJob {
    store: Arc<dyn ShipmentStore>,
    sessions: Arc<dyn TrackingSessionFactory>,
    dispatcher: DeliveryDispatcher,
    skip_report: SkipReportWriter,
    flow: TrackingFlow,
    settings: JobSettings,
    /// 同一时间只允许一个批次持有
    run_lock: Mutex<()>,
}

impl TrackingJob {
    pub fn new(
        store: Arc<dyn ShipmentStore>,
        sessions: Arc<dyn TrackingSessionFactory>,
        dispatcher: DeliveryDispatcher,
        skip_report: SkipReportWriter,
        settings: JobSettings,
    ) -> Self {
        Self {
            store,
            sessions,
            dispatcher,
            skip_report,
            flow: TrackingFlow::new(),
            settings,
            run_lock: Mutex::new(()),
        }
    }

    /// 按配置组装任务
    pub fn from_config(
        config: &Config,
        store: Arc<dyn ShipmentStore>,
        sessions: Arc<dyn TrackingSessionFactory>,
        dispatcher: DeliveryDispatcher,
    ) -> Self {
        Self::new(
            store,
            sessions,
            dispatcher.with_retries(config.dispatch_retries, Duration::from_secs(1)),
            SkipReportWriter::with_path(config.skip_report_file.clone()),
            JobSettings {
                chunk_size: config.chunk_size,
                skip_limit: config.skip_limit,
            },
        )
    }

    /// 运行一次对账批次
    ///
    /// 跳过数超限时返回 [`RunError::SkipLimitExceeded`]，此前提交的分块保留
    pub async fn run(&self) -> RunResult<RunReport> {
        let _guard = self.run_lock.try_lock().map_err(|_| {
            warn!("⚠️ 上一个对账批次还在运行，本次跳过");
            RunError::AlreadyRunning
        })?;

        let mut report = RunReport::new(Utc::now().format("%Y%m%d-%H%M%S").to_string());
        info!("🚚 批次 {} 开始", report.run_id);

        let session = self.sessions.open().await.map_err(|e| {
            error!("❌ 批次 {} 无法打开浏览器，中止: {}", report.run_id, e);
            RunError::Browser(e)
        })?;

        let outcome = AssertUnwindSafe(self.run_chunks(session.as_ref(), &mut report))
            .catch_unwind()
            .await;
        session.close().await;

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        report.finished_at = Utc::now();
        print_final_stats(&report);
        match result {
            Ok(()) => Ok(report),
            Err(e) => {
                error!("❌ 批次 {} 失败，需要人工跟进: {}", report.run_id, e);
                Err(e)
            }
        }
    }

    async fn run_chunks(
        &self,
        session: &dyn TrackingSession,
        report: &mut RunReport,
    ) -> RunResult<()> {
        let mut skips = SkipCounter::new(self.settings.skip_limit);
        let mut cursor: Option<ShipmentId> = None;
        let mut chunk_num = 0;

        loop {
            let chunk = self
                .store
                .find_by_status_after(&ShipmentStatus::TRACKABLE, cursor, self.settings.chunk_size)
                .await?;
            if chunk.is_empty() {
                break;
            }

            chunk_num += 1;
            let chunk_len = chunk.len();
            cursor = chunk.last().map(Shipment::id);
            report.read += chunk_len;
            log_chunk_start(&report.run_id, chunk_num, chunk_len);

            let result = chunk_processor::process_chunk(
                &self.flow,
                session,
                chunk,
                &report.run_id,
                chunk_num,
                &mut skips,
                &self.skip_report,
            )
            .await;
            report.unchanged += result.unchanged;
            report.skipped = skips.skipped();

            if result.aborted {
                return Err(RunError::SkipLimitExceeded {
                    skipped: skips.skipped(),
                    limit: skips.limit(),
                    chunks_committed: report.chunks_committed,
                });
            }

            let commit = if result.updated.is_empty() {
                ChunkCommit::default()
            } else {
                self.store.commit_chunk(&result.updated).await?
            };
            report.chunks_committed += 1;
            report.updated += commit.committed.len();
            report.stale += commit.stale.len();
            for id in &commit.stale {
                warn!(
                    "[批次 {}] ⚠️ 运单 {} 在读取后被修改，本次迁移放弃，下个批次重新对账",
                    report.run_id, id
                );
            }
            log_chunk_committed(&report.run_id, chunk_num, commit.committed.len(), chunk_len);

            // 提交之后才分发，未提交的迁移不会产生副作用
            for shipment in &commit.committed {
                if shipment.status() == ShipmentStatus::Delivered {
                    self.dispatcher.dispatch(shipment).await;
                    report.delivered += 1;
                }
            }

            if chunk_len < self.settings.chunk_size {
                break;
            }
        }

        Ok(())
    }

    /// 按需查询单个运单
    ///
    /// 不受定时调度影响，但会等待正在运行的批次结束
    pub async fn check_now(&self, shipment_id: ShipmentId) -> RunResult<ShipmentStatus> {
        let _guard = self.run_lock.lock().await;

        let mut shipment = self
            .store
            .find_by_id(shipment_id)
            .await?
            .ok_or(RunError::ShipmentNotFound(shipment_id))?;
        let read_version = shipment.modified_at();

        let session = self.sessions.open().await?;
        let ctx = ShipmentCtx::new("on-demand", 1, 1, shipment_id);
        let outcome = AssertUnwindSafe(self.flow.run(session.as_ref(), &mut shipment, &ctx))
            .catch_unwind()
            .await;
        session.close().await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        match outcome.map_err(|source| RunError::Item {
            id: shipment_id,
            source,
        })? {
            ItemOutcome::Updated(transition) => {
                let commit = self
                    .store
                    .commit_chunk(&[StatusCommit::new(transition, read_version)])
                    .await?;
                let committed = commit
                    .committed
                    .into_iter()
                    .next()
                    .ok_or(StoreError::Conflict(shipment_id))?;
                if committed.status() == ShipmentStatus::Delivered {
                    self.dispatcher.dispatch(&committed).await;
                }
                Ok(committed.status())
            }
            ItemOutcome::Unchanged => Ok(shipment.status()),
        }
    }
}
