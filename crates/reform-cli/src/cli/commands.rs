//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use reform_engine::ReturnSubmission;

/// 轮胎翻新远程单对账工具
///
/// 存储后端和引擎参数来自 `config/` 目录与 `REFORM_` 环境变量。
#[derive(Parser, Debug)]
#[command(name = "reform")]
#[command(version, about = "轮胎翻新远程单对账工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别，覆盖配置文件 (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 远程单管理
    #[command(subcommand)]
    Shipment(ShipmentCommand),

    /// 回收记录管理
    #[command(subcommand)]
    Return(ReturnCommand),

    /// 全局统计和奖励
    Stats {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 用户目录
    #[command(subcommand)]
    Users(UserCommand),
}

#[derive(Subcommand, Debug)]
pub enum ShipmentCommand {
    /// 新建远程单
    Create {
        /// 发货日期 (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// 发货数量
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,
    },

    /// 修正发货日期或数量
    Correct {
        shipment_id: String,

        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(short, long, allow_negative_numbers = true)]
        quantity: Option<i64>,
    },

    /// 删除远程单
    Delete { shipment_id: String },

    /// 列出远程单
    List {
        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReturnCommand {
    /// 登记回收记录
    Add {
        shipment_id: String,

        #[command(flatten)]
        args: ReturnArgs,
    },

    /// 编辑回收记录
    Edit {
        shipment_id: String,
        return_id: String,

        #[command(flatten)]
        args: ReturnArgs,
    },

    /// 删除回收记录
    Delete {
        shipment_id: String,
        return_id: String,
    },

    /// 预检回收记录，不写入
    Check {
        shipment_id: String,

        /// 编辑场景下被替换的记录 ID
        #[arg(long)]
        replacing: Option<String>,

        #[command(flatten)]
        args: ReturnArgs,
    },
}

/// 回收记录字段
#[derive(Args, Debug, Clone)]
pub struct ReturnArgs {
    /// 回收日期 (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: NaiveDate,

    /// 发票号
    #[arg(short, long, default_value = "")]
    pub invoice: String,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub reformed: i64,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub repaired: i64,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub exchanged: i64,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub failed: i64,

    /// 本次核销的奖励数量
    #[arg(long, allow_negative_numbers = true)]
    pub redeem: Option<i64>,
}

impl ReturnArgs {
    pub fn to_submission(&self) -> ReturnSubmission {
        let submission = ReturnSubmission::new(self.date, self.invoice.clone())
            .reformed(self.reformed)
            .repaired(self.repaired)
            .exchanged(self.exchanged)
            .failed(self.failed);

        match self.redeem {
            Some(bonuses) => submission.redeeming(bonuses),
            None => submission,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// 列出用户
    List,

    /// 注册用户
    Register {
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// 修改密码
    Passwd {
        username: String,

        #[arg(short, long)]
        password: String,
    },
}

// ============================================================================
// 单元测试
// ============================================================================
