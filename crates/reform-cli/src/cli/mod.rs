//! CLI 模块
//!
//! - `shipment` - 新建、修正、删除、列出远程单
//! - `return` - 登记、编辑、删除、预检回收记录
//! - `stats` - 全局统计和奖励
//! - `users` - 用户目录维护
//!
//! # 使用示例
//!
//! ```bash
//! reform shipment create --date 2024-05-01 --quantity 20
//! reform return add <shipment-id> --date 2024-05-10 --invoice NF-1 --reformed 10
//! reform stats --json
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands, ReturnArgs, ReturnCommand, ShipmentCommand, UserCommand};
pub use runner::CommandRunner;
