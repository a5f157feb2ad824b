use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::models::status::ShipmentStatus;
use crate::services::state_machine;

/// 运单 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShipmentId(pub i64);

impl std::fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 收件人信息（只有买家订单的运单才有）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// 运单归属
///
/// 一个运单要么属于订单（发往买家），要么属于寄售（卖家寄出），二者必居其一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShipmentBinding {
    /// 订单运单
    Order { order_id: i64, receiver: Receiver },
    /// 寄售运单
    Sale { sale_id: i64 },
}

impl ShipmentBinding {
    pub fn order_id(&self) -> Option<i64> {
        match self {
            ShipmentBinding::Order { order_id, .. } => Some(*order_id),
            ShipmentBinding::Sale { .. } => None,
        }
    }

    pub fn sale_id(&self) -> Option<i64> {
        match self {
            ShipmentBinding::Sale { sale_id } => Some(*sale_id),
            ShipmentBinding::Order { .. } => None,
        }
    }
}

/// 一次成功的状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub shipment_id: ShipmentId,
    pub from: ShipmentStatus,
    pub to: ShipmentStatus,
    pub at: DateTime<Utc>,
}

/// 运单
///
/// `status` 只能通过 [`Shipment::transition_to`] 修改，该方法会先查迁移表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    binding: ShipmentBinding,
    courier: Option<String>,
    tracking_number: Option<String>,
    status: ShipmentStatus,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    modified_at: DateTime<Utc>,
}

impl Shipment {
    /// 订单确认时创建（发往买家）
    pub fn for_order(id: ShipmentId, order_id: i64, receiver: Receiver) -> Self {
        Self::created(id, ShipmentBinding::Order { order_id, receiver })
    }

    /// 卖家登记寄出包裹时创建
    pub fn for_sale(id: ShipmentId, sale_id: i64) -> Self {
        Self::created(id, ShipmentBinding::Sale { sale_id })
    }

    fn created(id: ShipmentId, binding: ShipmentBinding) -> Self {
        let now = Utc::now();
        Self {
            id,
            binding,
            courier: None,
            tracking_number: None,
            status: ShipmentStatus::Pending,
            created_at: now,
            modified_at: now,
        }
    }

    /// 从存储中还原已持久化的运单
    pub fn restore(
        id: ShipmentId,
        binding: ShipmentBinding,
        courier: Option<String>,
        tracking_number: Option<String>,
        status: ShipmentStatus,
        created_at: DateTime<Utc>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            binding,
            courier,
            tracking_number,
            status,
            created_at,
            modified_at,
        }
    }

    pub fn id(&self) -> ShipmentId {
        self.id
    }

    pub fn binding(&self) -> &ShipmentBinding {
        &self.binding
    }

    pub fn order_id(&self) -> Option<i64> {
        self.binding.order_id()
    }

    pub fn courier(&self) -> Option<&str> {
        self.courier.as_deref()
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.tracking_number.as_deref()
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// 迁移到新状态
    ///
    /// 迁移表不允许时返回错误，运单保持不变
    pub fn transition_to(&mut self, next: ShipmentStatus) -> Result<Transition, TransitionError> {
        state_machine::ensure_transition(self.status, next)?;

        let now = Utc::now();
        let transition = Transition {
            shipment_id: self.id,
            from: self.status,
            to: next,
            at: now,
        };
        self.status = next;
        self.touch(now);
        Ok(transition)
    }

    /// 更新快递公司和运单号（不改变状态）
    pub(crate) fn set_tracking_info(&mut self, courier: String, tracking_number: String) {
        self.courier = Some(courier);
        self.tracking_number = Some(tracking_number);
        self.touch(Utc::now());
    }

    /// `modified_at` 同时是存储的版本号，每次修改都必须严格递增
    fn touch(&mut self, now: DateTime<Utc>) {
        self.modified_at = if now > self.modified_at {
            now
        } else {
            self.modified_at + Duration::nanoseconds(1)
        };
    }
}
