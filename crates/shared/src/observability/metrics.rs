//! 业务指标
//!
//! 通过 metrics crate 的门面记录计数。未安装 recorder 时所有记录都是空操作，
//! 需要导出时由宿主进程安装自己的 recorder。

use std::sync::Once;

static DESCRIBE: Once = Once::new();

/// 注册指标描述，重复调用只生效一次
pub fn describe() {
    DESCRIBE.call_once(|| {
        metrics::describe_counter!(
            "reform_admissions_total",
            "Return submissions checked for admission, by outcome"
        );
        metrics::describe_counter!(
            "reform_store_writes_total",
            "Whole-collection writes, by backend and outcome"
        );
        metrics::describe_counter!(
            "reform_bonus_notifications_total",
            "Times the pending bonus count increased"
        );
        metrics::describe_gauge!("reform_pending_bonuses", "Bonuses earned but not yet redeemed");
    });
}

/// 记录一次准入校验结果，`outcome` 为 `admitted` 或拒绝代码
#[inline]
pub fn record_admission(outcome: &'static str) {
    metrics::counter!("reform_admissions_total", "outcome" => outcome).increment(1);
}

/// 记录一次整集合写入
#[inline]
pub fn record_store_write(backend: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!(
        "reform_store_writes_total",
        "backend" => backend,
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录当前待领取奖励
#[inline]
pub fn record_pending_bonuses(pending: u64) {
    metrics::gauge!("reform_pending_bonuses").set(pending as f64);
}

/// 记录一次奖励提醒
#[inline]
pub fn record_bonus_notification() {
    metrics::counter!("reform_bonus_notifications_total").increment(1);
}
