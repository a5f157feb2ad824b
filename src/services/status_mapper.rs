//! 状态映射 - 业务能力层
//!
//! 把快递公司页面上的原始文字映射成标准状态。纯函数，没有副作用

use phf::phf_map;

use crate::models::ShipmentStatus;

/// 签收标记
pub const DELIVERED_MARKER: &str = "배달완료";
/// 派送标记
pub const OUT_FOR_DELIVERY_MARKER: &str = "배달출발";

/// 原始文字 → 标准状态（精确匹配）
static STATUS_TABLE: phf::Map<&'static str, ShipmentStatus> = phf_map! {
    "배달완료" => ShipmentStatus::Delivered,
    "배달출발" => ShipmentStatus::OutForDelivery,
};

/// 未知文字的默认状态
pub const FALLBACK_STATUS: ShipmentStatus = ShipmentStatus::InTransit;

/// 映射原始状态文字
///
/// 表里没有的文字一律视为运输中，不会把未知状态误判为签收
pub fn map(raw: &str) -> ShipmentStatus {
    STATUS_TABLE.get(raw).copied().unwrap_or(FALLBACK_STATUS)
}

/// 原始文字是否在映射表里
pub fn is_known(raw: &str) -> bool {
    STATUS_TABLE.contains_key(raw)
}
