use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Shipment, ShipmentId, ShipmentStatus};
use crate::store::{ChunkCommit, ShipmentStore, StatusCommit};

/// 内存存储
#[derive(Default)]
pub struct InMemoryShipmentStore {
    shipments: RwLock<BTreeMap<ShipmentId, Shipment>>,
}

impl InMemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shipments(shipments: impl IntoIterator<Item = Shipment>) -> Self {
        let map = shipments.into_iter().map(|s| (s.id(), s)).collect();
        Self {
            shipments: RwLock::new(map),
        }
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, shipment: Shipment) -> Result<(), StoreError> {
        let mut shipments = self.shipments.write().await;
        if shipments.contains_key(&shipment.id()) {
            return Err(StoreError::Duplicate(shipment.id()));
        }
        shipments.insert(shipment.id(), shipment);
        Ok(())
    }

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.shipments.read().await.get(&id).cloned())
    }

    async fn find_by_status_after(
        &self,
        statuses: &[ShipmentStatus],
        after: Option<ShipmentId>,
        limit: usize,
    ) -> Result<Vec<Shipment>, StoreError> {
        let shipments = self.shipments.read().await;
        let page = shipments
            .values()
            .filter(|s| after.map_or(true, |after| s.id() > after))
            .filter(|s| statuses.contains(&s.status()))
            .take(limit)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn save(
        &self,
        shipment: &Shipment,
        read_version: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut shipments = self.shipments.write().await;
        let stored = shipments
            .get(&shipment.id())
            .ok_or(StoreError::NotFound(shipment.id()))?;
        if stored.modified_at() != read_version {
            return Err(StoreError::Conflict(shipment.id()));
        }
        shipments.insert(shipment.id(), shipment.clone());
        Ok(())
    }

    async fn commit_chunk(&self, commits: &[StatusCommit]) -> Result<ChunkCommit, StoreError> {
        let mut shipments = self.shipments.write().await;

        // 先在副本上全部算好，再统一写入
        let mut result = ChunkCommit::default();
        for commit in commits {
            let id = commit.transition.shipment_id;
            let stored = shipments.get(&id).ok_or(StoreError::NotFound(id))?;
            if stored.modified_at() != commit.read_version {
                result.stale.push(id);
                continue;
            }

            let mut updated = stored.clone();
            match updated.transition_to(commit.transition.to) {
                Ok(_) => result.committed.push(updated),
                Err(_) => result.stale.push(id),
            }
        }

        for shipment in &result.committed {
            shipments.insert(shipment.id(), shipment.clone());
        }
        Ok(result)
    }
}
