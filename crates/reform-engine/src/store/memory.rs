//! 内存存储
//!
//! 使用 parking_lot 读写锁保护集合和版本号，适用于测试和演示。

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ShipmentStore, Snapshot};
use crate::error::{EngineError, Result};
use crate::models::Shipment;

#[derive(Debug, Default)]
struct State {
    shipments: Vec<Shipment>,
    version: u64,
}

/// 带版本号的内存存储
#[derive(Debug, Default)]
pub struct MemoryShipmentStore {
    state: RwLock<State>,
}

impl MemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以初始数据创建，版本号从 0 开始
    pub fn with_shipments(shipments: Vec<Shipment>) -> Self {
        Self {
            state: RwLock::new(State {
                shipments,
                version: 0,
            }),
        }
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }
}

#[async_trait]
impl ShipmentStore for MemoryShipmentStore {
    async fn load(&self) -> Result<Snapshot> {
        let state = self.state.read();
        Ok(Snapshot {
            shipments: state.shipments.clone(),
            version: Some(state.version),
        })
    }

    async fn save(
        &self,
        shipments: &[Shipment],
        expected_version: Option<u64>,
    ) -> Result<Option<u64>> {
        let mut state = self.state.write();

        if let Some(expected) = expected_version {
            if expected != state.version {
                return Err(EngineError::StaleSnapshot {
                    expected,
                    actual: state.version,
                });
            }
        }

        state.shipments = shipments.to_vec();
        state.version += 1;
        Ok(Some(state.version))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn shipment(id: &str) -> Shipment {
        Shipment::new(id, "REM-0001", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5)
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let store = MemoryShipmentStore::new();
        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.version, Some(0));
        assert!(snapshot.shipments.is_empty());

        let version = store.save(&[shipment("s-1")], snapshot.version).await.unwrap();
        assert_eq!(version, Some(1));

        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.shipments.len(), 1);
        assert_eq!(snapshot.version, Some(1));
    }

    #[tokio::test]
    async fn test_stale_write_is_rejected() {
        let store = MemoryShipmentStore::with_shipments(vec![shipment("s-1")]);
        let first = store.load().await.unwrap();
        let second = store.load().await.unwrap();

        store.save(&first.shipments, first.version).await.unwrap();
        let result = store.save(&second.shipments, second.version).await;

        assert!(matches!(
            result,
            Err(EngineError::StaleSnapshot {
                expected: 0,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_unversioned_write_overwrites() {
        let store = MemoryShipmentStore::with_shipments(vec![shipment("s-1")]);
        store.save(&[], None).await.unwrap();
        assert!(store.load().await.unwrap().shipments.is_empty());
        assert_eq!(store.version(), 1);
    }
}
