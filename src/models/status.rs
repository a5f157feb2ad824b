use serde::{Deserialize, Serialize};

/// 运单状态（系统内部的标准状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    /// 待发货
    Pending,
    /// 已发货
    Shipped,
    /// 运输中
    InTransit,
    /// 派送中
    OutForDelivery,
    /// 延误
    Delayed,
    /// 派送失败
    FailedDelivery,
    /// 已退回
    Returned,
    /// 已签收
    Delivered,
    /// 已取消
    Canceled,
}

impl ShipmentStatus {
    /// 全部状态，按生命周期顺序
    pub const ALL: [ShipmentStatus; 9] = [
        ShipmentStatus::Pending,
        ShipmentStatus::Shipped,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delayed,
        ShipmentStatus::FailedDelivery,
        ShipmentStatus::Returned,
        ShipmentStatus::Delivered,
        ShipmentStatus::Canceled,
    ];

    /// 对账任务需要追踪的状态
    pub const TRACKABLE: [ShipmentStatus; 2] =
        [ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery];

    /// 获取标准名称
    pub fn code(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::Shipped => "SHIPPED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delayed => "DELAYED",
            ShipmentStatus::FailedDelivery => "FAILED_DELIVERY",
            ShipmentStatus::Returned => "RETURNED",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Canceled => "CANCELED",
        }
    }

    pub fn is_trackable(self) -> bool {
        Self::TRACKABLE.contains(&self)
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
