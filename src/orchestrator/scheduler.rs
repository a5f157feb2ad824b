//! 定时调度器 - 编排层
//!
//! 按固定间隔触发对账批次。上一个批次没结束时，本次触发被拒绝

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::error::RunError;
use crate::orchestrator::batch_processor::{RunReport, TrackingJob};

pub struct TrackingScheduler {
    job: Arc<TrackingJob>,
    period: Duration,
}

impl TrackingScheduler {
    pub fn new(job: Arc<TrackingJob>, period: Duration) -> Self {
        Self { job, period }
    }

    /// 持续调度，直到 `shutdown` 完成
    ///
    /// 正在运行的批次不会被打断，收到停止信号后等它结束再退出
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("⏰ 调度器启动，间隔 {:?}", self.period);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("收到停止信号，调度器退出");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// 触发一次批次
    pub async fn tick(&self) -> Option<RunReport> {
        match self.job.run().await {
            Ok(report) => Some(report),
            Err(RunError::AlreadyRunning) => {
                warn!("⚠️ 上一个批次仍在运行，跳过本次触发");
                None
            }
            Err(e) => {
                error!("❌ 对账批次失败: {}", e);
                None
            }
        }
    }
}
