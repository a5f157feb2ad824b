//! 运单处理上下文
//!
//! 封装"我正在处理哪个批次第几块的哪个运单"这一信息

use std::fmt::Display;

use crate::models::ShipmentId;

/// 运单处理上下文
#[derive(Debug, Clone)]
pub struct ShipmentCtx {
    /// 批次 ID
    pub run_id: String,

    /// 分块编号（从1开始，仅用于日志显示）
    pub chunk_num: usize,

    /// 运单在分块中的索引（从1开始）
    pub item_index: usize,

    pub shipment_id: ShipmentId,
}

impl ShipmentCtx {
    pub fn new(run_id: &str, chunk_num: usize, item_index: usize, shipment_id: ShipmentId) -> Self {
        Self {
            run_id: run_id.to_string(),
            chunk_num,
            item_index,
            shipment_id,
        }
    }
}

impl Display for ShipmentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次 {} 块#{} 第{}个 运单#{}]",
            self.run_id, self.chunk_num, self.item_index, self.shipment_id
        )
    }
}
