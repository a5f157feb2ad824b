//! 运单对账流程 - 流程层
//!
//! 核心职责：定义"一个运单"的完整处理流程
//!
//! 流程顺序：
//! 1. 抓取快递公司页面的原始状态
//! 2. 映射为标准状态
//! 3. 通过状态机迁移
//!
//! 不负责持久化和副作用，那是编排层的事

use tracing::{debug, info, warn};

use crate::error::ItemError;
use crate::models::{Shipment, Transition};
use crate::services::tracking_scraper::TrackingSession;
use crate::services::{state_machine, status_mapper};
use crate::utils::instrument::timed;
use crate::utils::logging::truncate_text;
use crate::workflow::shipment_ctx::ShipmentCtx;

/// 单个运单的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 状态发生迁移
    Updated(Transition),
    /// 映射结果与当前状态相同
    Unchanged,
}

/// 运单对账流程
///
/// - 不持有浏览器，会话由调用方传入
/// - 出错时运单保持原样
#[derive(Debug, Default)]
pub struct TrackingFlow;

impl TrackingFlow {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        session: &dyn TrackingSession,
        shipment: &mut Shipment,
        ctx: &ShipmentCtx,
    ) -> Result<ItemOutcome, ItemError> {
        let tracking_number = shipment
            .tracking_number()
            .ok_or(ItemError::MissingTrackingNumber(shipment.id()))?
            .to_string();

        // ========== 1. 抓取 ==========
        let label = format!("抓取运单号 {}", tracking_number);
        let scraped = timed(&label, session.fetch_raw_status(&tracking_number)).await?;

        // ========== 2. 映射 ==========
        let target = status_mapper::map(&scraped.raw_status);
        if !status_mapper::is_known(&scraped.raw_status) {
            debug!(
                "{} 未收录的状态文字 '{}'，按 {} 处理",
                ctx,
                truncate_text(&scraped.raw_status, 40),
                target
            );
        }

        let current = shipment.status();
        if target == current {
            debug!("{} 状态无变化: {}", ctx, current);
            return Ok(ItemOutcome::Unchanged);
        }

        // ========== 3. 迁移 ==========
        match state_machine::apply(shipment, target) {
            Ok(transition) => {
                info!("{} ✓ {} → {}", ctx, transition.from, transition.to);
                Ok(ItemOutcome::Updated(transition))
            }
            Err(e) => {
                warn!(
                    "{} ⚠️ 数据一致性问题: 快递公司显示 '{}' ({}), 本地状态 {}: {}",
                    ctx,
                    truncate_text(&scraped.raw_status, 40),
                    target,
                    current,
                    e
                );
                Err(e.into())
            }
        }
    }
}
