//! 运单服务 - 业务能力层
//!
//! 处理管理端手动录入的物流信息，和定时对账相互独立

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::info;

use crate::error::{StoreError, TrackingInfoError};
use crate::models::{Shipment, ShipmentId, ShipmentStatus};
use crate::store::ShipmentStore;

/// 运单号格式：去掉空格和连字符后为 8~20 位字母数字
static TRACKING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{8,20}$").expect("运单号正则无效"));

pub struct ShipmentService {
    store: Arc<dyn ShipmentStore>,
}

impl ShipmentService {
    pub fn new(store: Arc<dyn ShipmentStore>) -> Self {
        Self { store }
    }

    /// 录入快递公司和运单号，并把运单推进到运输中
    ///
    /// - PENDING：依次经过 SHIPPED → IN_TRANSIT
    /// - SHIPPED：直接到 IN_TRANSIT
    /// - IN_TRANSIT：只更新运单信息（更正运单号）
    /// - 其他状态：返回迁移错误，运单不变
    pub async fn update_tracking_info(
        &self,
        shipment_id: ShipmentId,
        courier: &str,
        tracking_number: &str,
    ) -> Result<Shipment, TrackingInfoError> {
        let courier = courier.trim();
        if courier.is_empty() {
            return Err(TrackingInfoError::EmptyCourier);
        }
        let tracking_number = normalize_tracking_number(tracking_number)?;

        let shipment = self
            .store
            .find_by_id(shipment_id)
            .await?
            .ok_or(StoreError::NotFound(shipment_id))?;

        // 在副本上推进，任何一步失败都不影响原运单
        let mut updated = shipment.clone();
        if updated.status() == ShipmentStatus::Pending {
            updated.transition_to(ShipmentStatus::Shipped)?;
        }
        if updated.status() != ShipmentStatus::InTransit {
            updated.transition_to(ShipmentStatus::InTransit)?;
        }
        updated.set_tracking_info(courier.to_string(), tracking_number);

        // 读取之后被对账批次改过时返回冲突，不覆盖批次的结果
        self.store.save(&updated, shipment.modified_at()).await?;
        info!(
            "[运单 {}] 已录入物流信息: {} {} ({} → {})",
            shipment_id,
            courier,
            updated.tracking_number().unwrap_or_default(),
            shipment.status(),
            updated.status()
        );

        Ok(updated)
    }
}

/// 去掉空格和连字符并校验格式
pub fn normalize_tracking_number(raw: &str) -> Result<String, TrackingInfoError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if !TRACKING_NUMBER.is_match(&cleaned) {
        return Err(TrackingInfoError::InvalidTrackingNumber(raw.to_string()));
    }
    Ok(cleaned)
}
