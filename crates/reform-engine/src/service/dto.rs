//! 服务层返回结构

use serde::Serialize;

use crate::models::{BonusStats, ReturnEvent, StatusBreakdown};

/// 回收记录写入结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    pub shipment_id: String,
    pub event: ReturnEvent,
    /// 写入后的全局统计
    pub stats: BonusStats,
    /// 待领取奖励增加时为当前可领取数量
    pub bonus_notice: Option<u64>,
}

/// 统计报表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub shipment_count: usize,
    pub stats: BonusStats,
    pub breakdown: StatusBreakdown,
    pub success_rate: f64,
    /// 待领取奖励自上次观察后增加时为当前可领取数量
    pub bonus_notice: Option<u64>,
}
