//! 单个分块处理器 - 编排层
//!
//! ## 职责
//!
//! - 按读取顺序逐个处理分块中的运单
//! - 单个运单失败时跳过，记录日志和跳过报告，累计跳过数
//! - 跳过数超过上限时立即停止，本块结果作废
//!
//! 持久化和副作用由 `batch_processor` 在提交时完成

use tracing::error;

use crate::models::Shipment;
use crate::services::tracking_scraper::TrackingSession;
use crate::services::SkipReportWriter;
use crate::store::StatusCommit;
use crate::workflow::{ItemOutcome, ShipmentCtx, TrackingFlow};

/// 批次范围内的跳过计数
#[derive(Debug, Clone)]
pub struct SkipCounter {
    limit: usize,
    skipped: usize,
}

impl SkipCounter {
    pub fn new(limit: usize) -> Self {
        Self { limit, skipped: 0 }
    }

    /// 记录一次跳过，返回是否已超过上限
    pub fn record(&mut self) -> bool {
        self.skipped += 1;
        self.is_exceeded()
    }

    pub fn is_exceeded(&self) -> bool {
        self.skipped > self.limit
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// 分块处理结果
#[derive(Debug, Default)]
pub struct ChunkResult {
    /// 需要提交的状态迁移（保持读取顺序）
    pub updated: Vec<StatusCommit>,
    pub unchanged: usize,
    pub skipped: usize,
    /// 跳过数超限，本块不能提交
    pub aborted: bool,
}

/// 处理一个分块
pub async fn process_chunk(
    flow: &TrackingFlow,
    session: &dyn TrackingSession,
    chunk: Vec<Shipment>,
    run_id: &str,
    chunk_num: usize,
    skips: &mut SkipCounter,
    skip_report: &SkipReportWriter,
) -> ChunkResult {
    let mut result = ChunkResult::default();

    for (idx, mut shipment) in chunk.into_iter().enumerate() {
        let ctx = ShipmentCtx::new(run_id, chunk_num, idx + 1, shipment.id());
        let read_version = shipment.modified_at();

        match flow.run(session, &mut shipment, &ctx).await {
            Ok(ItemOutcome::Updated(transition)) => {
                result.updated.push(StatusCommit::new(transition, read_version));
            }
            Ok(ItemOutcome::Unchanged) => {
                result.unchanged += 1;
            }
            Err(e) => {
                error!("{} ❌ 跳过: {}", ctx, e);
                skip_report
                    .write(run_id, shipment.id(), shipment.tracking_number(), &e)
                    .await;
                result.skipped += 1;

                if skips.record() {
                    error!(
                        "{} 🛑 跳过数 {} 超过上限 {}，停止批次",
                        ctx,
                        skips.skipped(),
                        skips.limit()
                    );
                    result.aborted = true;
                    break;
                }
            }
        }
    }

    result
}
