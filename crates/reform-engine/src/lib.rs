//! 轮胎翻新远程单对账引擎
//!
//! 跟踪送去翻新的轮胎批次（远程单）以及每批的回收记录，
//! 计算全局统计和翻新奖励。
//!
//! ## 核心功能
//!
//! - **准入校验**：回收记录在写入前按固定顺序校验，整体接受或拒绝
//! - **状态推导**：远程单状态由回收数量推导，从不单独存储
//! - **奖励统计**：每 15 条翻新累计一次奖励，核销后扣减待领取数量
//! - **整集合存储**：内存、JSON 文件、远程表格三种后端
//! - **用户目录**：维护可登录用户列表
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `engine`: 无副作用的对账计算
//! - `store`: 远程单存储
//! - `directory`: 用户目录
//! - `service`: 对账服务层

pub mod directory;
pub mod engine;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use directory::{MemoryUserDirectory, UserAccount, UserDirectory};
pub use engine::{
    AdmissionRejection, AdmittedReturn, BonusWatcher, ReconciliationEngine, Removal,
    ShipmentCorrection,
};
pub use error::{EngineError, Result};
pub use models::{BonusStats, ReturnEvent, ReturnSubmission, Shipment, ShipmentStatus};
pub use service::{ReconciliationService, ReturnReceipt, StatsReport};
pub use store::{FileShipmentStore, MemoryShipmentStore, SheetClient, ShipmentStore, Snapshot};
