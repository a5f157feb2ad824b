//! 外部协作方的日志实现
//!
//! 订单和通知领域不在本服务内，独立运行时用这两个实现记录应当发生的调用

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::services::dispatcher::{OrderCompletion, ShipmentNotifier};

#[derive(Debug, Default)]
pub struct LoggingOrderCompletion;

#[async_trait]
impl OrderCompletion for LoggingOrderCompletion {
    async fn complete_order(&self, order_id: i64) -> Result<(), DispatchError> {
        info!("📦 订单 {} 标记为已完成", order_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl ShipmentNotifier for LoggingNotifier {
    async fn notify_shipment_completed(&self, order_id: i64) -> Result<(), DispatchError> {
        info!("🔔 已通知订单 {} 的买家: 商品已签收", order_id);
        Ok(())
    }
}
