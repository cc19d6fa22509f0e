//! 奖励到账提醒
//!
//! 记住上一次看到的待领取奖励数量，数量增加时触发一次提醒

use crate::models::BonusStats;

#[derive(Debug, Clone, Copy, Default)]
pub struct BonusWatcher {
    last_pending: u64,
}

impl BonusWatcher {
    /// 以当前统计作为基线，避免启动时对历史奖励重复提醒
    pub fn starting_from(stats: &BonusStats) -> Self {
        Self {
            last_pending: stats.pending_bonuses,
        }
    }

    /// 观察新的统计值
    ///
    /// 待领取数量增加时返回 `Some(当前可领取数量)`，减少时静默跟随
    pub fn observe(&mut self, stats: &BonusStats) -> Option<u64> {
        let pending = stats.pending_bonuses;
        let increased = pending > self.last_pending;
        self.last_pending = pending;

        increased.then_some(pending)
    }

    pub fn last_pending(&self) -> u64 {
        self.last_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(pending: u64) -> BonusStats {
        BonusStats {
            pending_bonuses: pending,
            ..Default::default()
        }
    }

    #[test]
    fn test_notifies_only_on_increase() {
        let mut watcher = BonusWatcher::default();

        assert_eq!(watcher.observe(&stats(0)), None);
        assert_eq!(watcher.observe(&stats(2)), Some(2));
        assert_eq!(watcher.observe(&stats(2)), None);
        assert_eq!(watcher.observe(&stats(1)), None);
        assert_eq!(watcher.last_pending(), 1);
        assert_eq!(watcher.observe(&stats(2)), Some(2));
    }

    #[test]
    fn test_starting_from_baseline() {
        let mut watcher = BonusWatcher::starting_from(&stats(3));
        assert_eq!(watcher.observe(&stats(3)), None);
        assert_eq!(watcher.observe(&stats(4)), Some(4));
    }
}
