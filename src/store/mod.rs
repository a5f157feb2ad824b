//! 运单存储
//!
//! 对账任务只需要：按状态分页读取、按 ID 读取、按分块整体写入。
//! 写入都带读取时的版本（`modified_at`），期间被改过的运单不会被旧快照覆盖

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Shipment, ShipmentId, ShipmentStatus, Transition};

pub use memory::InMemoryShipmentStore;

/// 待提交的状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCommit {
    pub transition: Transition,
    /// 读取运单时的 `modified_at`
    pub read_version: DateTime<Utc>,
}

impl StatusCommit {
    pub fn new(transition: Transition, read_version: DateTime<Utc>) -> Self {
        Self {
            transition,
            read_version,
        }
    }
}

/// 分块提交结果
#[derive(Debug, Default)]
pub struct ChunkCommit {
    /// 已写入的运单（写入后的最新状态）
    pub committed: Vec<Shipment>,
    /// 读取之后被修改过、本次没有写入的运单
    pub stale: Vec<ShipmentId>,
}

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    async fn insert(&self, shipment: Shipment) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError>;

    /// 按 ID 升序读取状态在 `statuses` 中、且 ID 大于 `after` 的运单，最多 `limit` 个
    ///
    /// 用 ID 游标而不是偏移量分页，已处理运单的状态变化不会导致漏读
    async fn find_by_status_after(
        &self,
        statuses: &[ShipmentStatus],
        after: Option<ShipmentId>,
        limit: usize,
    ) -> Result<Vec<Shipment>, StoreError>;

    /// 保存整个运单
    ///
    /// 存储中的 `modified_at` 与 `read_version` 不同时返回 [`StoreError::Conflict`]
    async fn save(&self, shipment: &Shipment, read_version: DateTime<Utc>)
        -> Result<(), StoreError>;

    /// 整体提交一个分块的状态迁移
    ///
    /// - 只写状态，其他字段保留存储中的值
    /// - 版本不一致的运单放进 `stale`，不写入
    /// - 任何运单不存在时整块都不写
    async fn commit_chunk(&self, commits: &[StatusCommit]) -> Result<ChunkCommit, StoreError>;
}
