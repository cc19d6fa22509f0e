//! 服务层
//!
//! 串联存储和引擎：每次变更前重新读取快照，校验后按快照版本写回。

pub mod dto;
pub mod reconciliation_service;

pub use dto::{ReturnReceipt, StatsReport};
pub use reconciliation_service::ReconciliationService;
