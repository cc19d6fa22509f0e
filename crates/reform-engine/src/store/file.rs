//! JSON 文件存储
//!
//! 文件内容为 `{ "version": n, "shipments": [...] }`，也兼容直接存放数组的旧文件。
//! 写入先落到临时文件再原子替换，进程内的写入通过互斥锁串行化。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::wire::{decode_snapshot, encode_snapshot};
use super::{ShipmentStore, Snapshot};
use crate::error::{EngineError, Result};
use crate::models::Shipment;

/// 带版本号的 JSON 文件存储
#[derive(Debug)]
pub struct FileShipmentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileShipmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_snapshot(&self) -> Result<(Vec<Shipment>, u64)> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file not found, starting empty");
                return Ok((Vec::new(), 0));
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok((Vec::new(), 0));
        }

        let payload: Value = serde_json::from_slice(&bytes)?;
        Ok(decode_snapshot(payload))
    }
}

#[async_trait]
impl ShipmentStore for FileShipmentStore {
    async fn load(&self) -> Result<Snapshot> {
        let (shipments, version) = self.read_snapshot().await?;
        Ok(Snapshot {
            shipments,
            version: Some(version),
        })
    }

    async fn save(
        &self,
        shipments: &[Shipment],
        expected_version: Option<u64>,
    ) -> Result<Option<u64>> {
        let _guard = self.write_lock.lock().await;

        let (_, current) = self.read_snapshot().await?;
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(EngineError::StaleSnapshot {
                    expected,
                    actual: current,
                });
            }
        }

        let next = current + 1;
        let payload = serde_json::to_vec_pretty(&encode_snapshot(shipments, next)?)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(
            path = %self.path.display(),
            version = next,
            shipment_count = shipments.len(),
            "Store file written"
        );

        Ok(Some(next))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("reform-store-{}", Uuid::new_v4()))
            .join("shipments.json")
    }

    fn shipment(id: &str) -> Shipment {
        Shipment::new(id, "REM-0001", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 3)
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let store = FileShipmentStore::new(temp_path());
        let snapshot = store.load().await.unwrap();
        assert!(snapshot.shipments.is_empty());
        assert_eq!(snapshot.version, Some(0));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let path = temp_path();
        let store = FileShipmentStore::new(&path);

        let version = store.save(&[shipment("s-1")], Some(0)).await.unwrap();
        assert_eq!(version, Some(1));

        let reopened = FileShipmentStore::new(&path);
        let snapshot = reopened.load().await.unwrap();
        assert_eq!(snapshot.shipments, vec![shipment("s-1")]);
        assert_eq!(snapshot.version, Some(1));

        let result = reopened.save(&[], Some(0)).await;
        assert!(matches!(result, Err(EngineError::StaleSnapshot { .. })));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_reads_legacy_bare_array() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"[{"id":"s-1","number":"REM-0001","sendDate":"2024-02-01","quantitySent":3,"returns":[]}]"#,
        )
        .unwrap();

        let snapshot = FileShipmentStore::new(&path).load().await.unwrap();
        assert_eq!(snapshot.shipments, vec![shipment("s-1")]);
        assert_eq!(snapshot.version, Some(0));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
