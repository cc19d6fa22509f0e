//! 奖励统计模型
//!
//! 统计值完全由远程单集合推导，从不单独持久化

use std::iter::Sum;
use std::ops::Add;

use serde::Serialize;

use super::enums::ShipmentStatus;

/// 默认奖励阈值：每 15 条翻新产生一次奖励
pub const BONUS_THRESHOLD: u32 = 15;

/// 累加计数
///
/// 只包含求和字段，满足交换律和结合律，可以按远程单分别累加后合并
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub sent: u64,
    pub reformed: u64,
    pub repaired: u64,
    pub exchanged: u64,
    pub failed: u64,
    pub bonus_paid: u64,
}

impl Add for Tally {
    type Output = Tally;

    fn add(self, rhs: Tally) -> Tally {
        Tally {
            sent: self.sent + rhs.sent,
            reformed: self.reformed + rhs.reformed,
            repaired: self.repaired + rhs.repaired,
            exchanged: self.exchanged + rhs.exchanged,
            failed: self.failed + rhs.failed,
            bonus_paid: self.bonus_paid + rhs.bonus_paid,
        }
    }
}

impl Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        iter.fold(Tally::default(), Add::add)
    }
}

/// 全局奖励统计
///
/// 奖励累计口径：已获得奖励只随翻新数量单调增长，
/// 核销数量只在计算待领取奖励时扣减一次
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusStats {
    pub total_sent: u64,
    pub total_reformed: u64,
    pub total_repaired: u64,
    pub total_exchanged: u64,
    pub total_failed: u64,
    pub total_bonus_earned: u64,
    pub total_bonus_paid: u64,
    pub pending_bonuses: u64,
    /// 距离下一次奖励已累计的翻新数量
    pub bonus_progress: u64,
    pub bonus_threshold: u32,
}

impl BonusStats {
    /// 由累加计数推导统计值
    ///
    /// 阈值为 0 时视为 1，避免除零
    pub fn from_tally(tally: Tally, threshold: u32) -> Self {
        let threshold = threshold.max(1);
        let step = u64::from(threshold);
        let earned = tally.reformed / step;

        Self {
            total_sent: tally.sent,
            total_reformed: tally.reformed,
            total_repaired: tally.repaired,
            total_exchanged: tally.exchanged,
            total_failed: tally.failed,
            total_bonus_earned: earned,
            total_bonus_paid: tally.bonus_paid,
            pending_bonuses: earned.saturating_sub(tally.bonus_paid),
            bonus_progress: tally.reformed % step,
            bonus_threshold: threshold,
        }
    }

    /// 已回收总数（四种处置之和）
    pub fn total_returned(&self) -> u64 {
        self.total_reformed + self.total_repaired + self.total_exchanged + self.total_failed
    }

    /// 翻新成功率（百分比），未回收时为 0
    pub fn success_rate(&self) -> f64 {
        let total = self.total_returned();
        if total == 0 {
            return 0.0;
        }
        self.total_reformed as f64 / total as f64 * 100.0
    }
}

/// 各状态远程单数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub awaiting: usize,
    pub partial: usize,
    pub finished: usize,
}

impl StatusBreakdown {
    pub fn record(&mut self, status: ShipmentStatus) {
        match status {
            ShipmentStatus::Awaiting => self.awaiting += 1,
            ShipmentStatus::Partial => self.partial += 1,
            ShipmentStatus::Finished => self.finished += 1,
        }
    }

    /// 未完结的远程单数量
    pub fn open(&self) -> usize {
        self.awaiting + self.partial
    }
}
