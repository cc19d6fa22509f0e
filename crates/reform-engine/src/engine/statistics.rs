//! 全局统计折叠
//!
//! 对所有远程单及其回收记录做一次遍历求和，再推导奖励统计。
//! 只包含求和，顺序无关，可整体重算也可按远程单分别累加后合并。

use crate::models::{BonusStats, ReturnEvent, Shipment, StatusBreakdown, Tally};

/// 单条回收记录的计数
pub fn tally_event(event: &ReturnEvent) -> Tally {
    Tally {
        sent: 0,
        reformed: u64::from(event.reformed),
        repaired: u64::from(event.repaired),
        exchanged: u64::from(event.exchanged),
        failed: u64::from(event.failed),
        bonus_paid: u64::from(event.bonuses_redeemed),
    }
}

/// 单个远程单的计数（含发货数量）
pub fn tally_shipment(shipment: &Shipment) -> Tally {
    let sent = Tally {
        sent: u64::from(shipment.quantity_sent),
        ..Default::default()
    };
    sent + shipment.returns.iter().map(tally_event).sum::<Tally>()
}

/// 远程单集合的计数
pub fn tally_all(shipments: &[Shipment]) -> Tally {
    shipments.iter().map(tally_shipment).sum()
}

/// 远程单集合的计数，排除指定的回收记录
pub fn tally_excluding(shipments: &[Shipment], return_id: Option<&str>) -> Tally {
    shipments
        .iter()
        .flat_map(|s| s.returns.iter())
        .filter(|r| Some(r.id.as_str()) != return_id)
        .map(tally_event)
        .sum::<Tally>()
        + Tally {
            sent: shipments.iter().map(|s| u64::from(s.quantity_sent)).sum(),
            ..Default::default()
        }
}

/// 计算全局奖励统计
pub fn fold(shipments: &[Shipment], threshold: u32) -> BonusStats {
    BonusStats::from_tally(tally_all(shipments), threshold)
}

/// 按状态统计远程单数量
pub fn status_breakdown(shipments: &[Shipment]) -> StatusBreakdown {
    let mut breakdown = StatusBreakdown::default();
    for shipment in shipments {
        breakdown.record(shipment.status());
    }
    breakdown
}
