//! 签收副作用分发 - 业务能力层
//!
//! 运单刚刚迁移到 DELIVERED 时调用：先完成订单，再通知买家。
//! 两步都是尽力而为，失败只记录日志，不回滚已经提交的状态

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::DispatchError;
use crate::models::{Shipment, ShipmentBinding, ShipmentStatus};
use crate::utils::instrument::with_retry;

/// 订单服务（外部协作方）
///
/// 调用超时或失败时分发器会重试，而上一次调用可能已经生效，
/// 所以实现必须幂等：同一个 `order_id` 完成多次与完成一次结果相同
#[async_trait]
pub trait OrderCompletion: Send + Sync {
    async fn complete_order(&self, order_id: i64) -> Result<(), DispatchError>;
}

/// 通知服务（外部协作方）
///
/// 同样会被重试，实现应按 `order_id` 去重
#[async_trait]
pub trait ShipmentNotifier: Send + Sync {
    async fn notify_shipment_completed(&self, order_id: i64) -> Result<(), DispatchError>;
}

/// 分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 订单完成和通知都成功
    Completed,
    /// 至少一步失败（已记录日志）
    Partial,
    /// 寄售运单，没有买家订单
    NotApplicable,
}

/// 签收副作用分发器
#[derive(Clone)]
pub struct DeliveryDispatcher {
    orders: Arc<dyn OrderCompletion>,
    notifier: Arc<dyn ShipmentNotifier>,
    retries: usize,
    retry_delay: Duration,
}

impl DeliveryDispatcher {
    pub fn new(orders: Arc<dyn OrderCompletion>, notifier: Arc<dyn ShipmentNotifier>) -> Self {
        Self {
            orders,
            notifier,
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }

    /// 设置失败重试次数
    ///
    /// 大于 0 时要求 [`OrderCompletion`] 和 [`ShipmentNotifier`] 的实现幂等
    pub fn with_retries(mut self, retries: usize, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    /// 分发签收副作用
    ///
    /// 只接受已经是 DELIVERED 的运单
    pub async fn dispatch(&self, shipment: &Shipment) -> DispatchOutcome {
        debug_assert_eq!(shipment.status(), ShipmentStatus::Delivered);

        let order_id = match shipment.binding() {
            ShipmentBinding::Order { order_id, .. } => *order_id,
            ShipmentBinding::Sale { sale_id } => {
                info!(
                    "[运单 {}] 寄售 {} 已签收，没有需要完成的订单",
                    shipment.id(),
                    sale_id
                );
                return DispatchOutcome::NotApplicable;
            }
        };

        let attempts = self.retries + 1;
        let mut outcome = DispatchOutcome::Completed;

        if let Err(e) = with_retry("完成订单", attempts, self.retry_delay, || {
            self.orders.complete_order(order_id)
        })
        .await
        {
            error!("[运单 {}] ❌ {}", shipment.id(), e);
            outcome = DispatchOutcome::Partial;
        }

        if let Err(e) = with_retry("签收通知", attempts, self.retry_delay, || {
            self.notifier.notify_shipment_completed(order_id)
        })
        .await
        {
            error!("[运单 {}] ❌ {}", shipment.id(), e);
            outcome = DispatchOutcome::Partial;
        }

        if outcome == DispatchOutcome::Completed {
            info!("[运单 {}] ✓ 订单 {} 已完成并通知买家", shipment.id(), order_id);
        }
        outcome
    }
}
