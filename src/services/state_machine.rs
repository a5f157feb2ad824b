//! 运单状态机 - 业务能力层
//!
//! 全部合法迁移都写在 [`TRANSITIONS`] 这一张表里，不做任何 I/O

use crate::error::TransitionError;
use crate::models::{Shipment, ShipmentStatus, Transition};

use ShipmentStatus::*;

/// 迁移表：当前状态 → 允许的下一个状态
///
/// 没有出边的状态就是终止状态
pub const TRANSITIONS: [(ShipmentStatus, &[ShipmentStatus]); 9] = [
    (Pending, &[Shipped, Canceled]),
    (Shipped, &[InTransit, Returned, Canceled]),
    (InTransit, &[OutForDelivery, Delayed, Canceled, Delivered]),
    (OutForDelivery, &[Delivered, FailedDelivery, Canceled]),
    (Delayed, &[InTransit, Canceled]),
    (FailedDelivery, &[Returned, OutForDelivery, Canceled]),
    (Returned, &[Canceled]),
    (Delivered, &[]),
    (Canceled, &[]),
];

/// 查询某个状态允许迁移到哪些状态
pub fn allowed_next(current: ShipmentStatus) -> &'static [ShipmentStatus] {
    TRANSITIONS
        .iter()
        .find(|(state, _)| *state == current)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn is_terminal(status: ShipmentStatus) -> bool {
    allowed_next(status).is_empty()
}

pub fn can_transition(current: ShipmentStatus, next: ShipmentStatus) -> bool {
    allowed_next(current).contains(&next)
}

/// 校验迁移是否合法
pub fn ensure_transition(
    current: ShipmentStatus,
    next: ShipmentStatus,
) -> Result<(), TransitionError> {
    if is_terminal(current) {
        return Err(TransitionError::Terminal {
            from: current,
            to: next,
        });
    }
    if !can_transition(current, next) {
        return Err(TransitionError::NotAllowed {
            from: current,
            to: next,
        });
    }
    Ok(())
}

/// 对运单应用迁移，失败时运单不变
pub fn apply(shipment: &mut Shipment, next: ShipmentStatus) -> Result<Transition, TransitionError> {
    shipment.transition_to(next)
}
