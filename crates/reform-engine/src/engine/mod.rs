//! 对账引擎
//!
//! 同步、无副作用的纯计算：
//!
//! - `admission`: 回收记录准入校验
//! - `statistics`: 全局奖励统计折叠
//! - `ledger`: 远程单集合的增删改
//! - `watcher`: 奖励到账提醒

pub mod admission;
pub mod ledger;
pub mod statistics;
pub mod watcher;

pub use admission::{
    admit, normalize_invoice, AdmissionContext, AdmissionRejection, AdmittedReturn, InvoiceIndex,
};
pub use ledger::{
    next_shipment_number, ReconciliationEngine, Removal, ShipmentCorrection,
    SHIPMENT_NUMBER_PREFIX,
};
pub use watcher::BonusWatcher;
