//! 远程单存储
//!
//! 存储只提供整集合的读写，不支持局部更新。
//! 支持版本号的存储在写入时校验快照版本，拒绝基于过期快照的写入；
//! 不支持版本号的存储按整集合"后写覆盖"处理。

pub mod file;
pub mod memory;
pub mod sheet;
pub mod wire;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Shipment;

pub use file::FileShipmentStore;
pub use memory::MemoryShipmentStore;
pub use sheet::SheetClient;

/// 存储快照
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub shipments: Vec<Shipment>,
    /// 快照版本，存储不支持版本号时为 None
    pub version: Option<u64>,
}

/// 远程单存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// 读取完整集合
    async fn load(&self) -> Result<Snapshot>;

    /// 写入完整集合
    ///
    /// `expected_version` 为读取时的版本号，与当前版本不一致时返回
    /// `EngineError::StaleSnapshot`。返回写入后的新版本号。
    async fn save(&self, shipments: &[Shipment], expected_version: Option<u64>)
        -> Result<Option<u64>>;

    /// 后端名称（用于日志）
    fn backend(&self) -> &'static str;
}
