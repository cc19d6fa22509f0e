//! 回收记录准入校验
//!
//! 判断一条待提交的回收记录能否追加到远程单（或替换被编辑的记录）。
//! 校验只做分类，不做截断：要么整体接受，要么返回拒绝原因。
//!
//! ## 校验顺序
//!
//! 1. 数值合法性 -> 2. 非空提交 -> 3. 剩余容量 -> 4. 发票号必填
//!    -> 5. 发票号去重 -> 6. 奖励余额

use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{BonusStats, ReturnEvent, ReturnSubmission, Shipment, Tally};

/// 准入拒绝原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionRejection {
    #[error("提交数量为 0")]
    EmptySubmission,

    #[error("回收数量超过剩余容量: 提交 {requested}, 剩余 {remaining}")]
    ExceedsCapacity { requested: u64, remaining: u64 },

    #[error("发票号已存在: {invoice}")]
    DuplicateInvoice { invoice: String },

    #[error("发票号不能为空")]
    MissingInvoice,

    #[error("数值字段非法: {field}")]
    MalformedInput { field: &'static str },

    #[error("待领取奖励不足: 需要 {requested}, 可用 {pending}")]
    InsufficientBonuses { requested: u64, pending: u64 },
}

impl AdmissionRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySubmission => "EMPTY_SUBMISSION",
            Self::ExceedsCapacity { .. } => "EXCEEDS_CAPACITY",
            Self::DuplicateInvoice { .. } => "DUPLICATE_INVOICE",
            Self::MissingInvoice => "MISSING_INVOICE",
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::InsufficientBonuses { .. } => "INSUFFICIENT_BONUSES",
        }
    }
}

/// 已使用发票号索引（归一化为去空格小写）
#[derive(Debug, Clone, Default)]
pub struct InvoiceIndex {
    used: HashSet<String>,
}

impl InvoiceIndex {
    /// 收集所有远程单中的发票号，`exclude_return` 为被编辑的记录
    pub fn from_shipments(shipments: &[Shipment], exclude_return: Option<&str>) -> Self {
        let used = shipments
            .iter()
            .flat_map(|s| s.returns.iter())
            .filter(|r| Some(r.id.as_str()) != exclude_return)
            .map(|r| normalize_invoice(&r.invoice_number))
            .filter(|invoice| !invoice.is_empty())
            .collect();

        Self { used }
    }

    pub fn contains(&self, invoice: &str) -> bool {
        self.used.contains(&normalize_invoice(invoice))
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

/// 发票号归一化：去掉首尾空白并转小写
pub fn normalize_invoice(invoice: &str) -> String {
    invoice.trim().to_lowercase()
}

/// 准入上下文
#[derive(Debug, Clone, Copy)]
pub struct AdmissionContext<'a> {
    /// 目标远程单
    pub shipment: &'a Shipment,
    /// 其他记录已使用的发票号（已排除被编辑的记录）
    pub used_invoices: &'a InvoiceIndex,
    /// 被替换的记录 ID（仅编辑时）
    pub replacing: Option<&'a str>,
    /// 除被编辑记录外所有回收记录的计数
    pub others: Tally,
    pub bonus_threshold: u32,
}

impl AdmissionContext<'_> {
    /// 候选记录写入后可核销的奖励数量
    ///
    /// 计入候选记录自身的翻新数量，不计入它的核销数量
    pub fn available_bonuses(&self, reformed: u32) -> u64 {
        let with_candidate = self.others
            + Tally {
                reformed: u64::from(reformed),
                ..Default::default()
            };
        BonusStats::from_tally(with_candidate, self.bonus_threshold).pending_bonuses
    }
}

/// 通过准入的回收记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedReturn {
    pub date: NaiveDate,
    /// 已去除首尾空白
    pub invoice_number: String,
    pub reformed: u32,
    pub repaired: u32,
    pub exchanged: u32,
    pub failed: u32,
    pub bonuses_redeemed: u32,
}

impl AdmittedReturn {
    pub fn total_handled(&self) -> u64 {
        u64::from(self.reformed)
            + u64::from(self.repaired)
            + u64::from(self.exchanged)
            + u64::from(self.failed)
    }

    pub fn into_event(self, id: impl Into<String>) -> ReturnEvent {
        ReturnEvent {
            id: id.into(),
            date: self.date,
            invoice_number: self.invoice_number,
            reformed: self.reformed,
            repaired: self.repaired,
            exchanged: self.exchanged,
            failed: self.failed,
            bonuses_redeemed: self.bonuses_redeemed,
        }
    }
}

/// 校验待提交的回收记录
///
/// 纯函数：相同输入总是得到相同结果
pub fn admit(
    candidate: &ReturnSubmission,
    ctx: &AdmissionContext<'_>,
) -> Result<AdmittedReturn, AdmissionRejection> {
    let reformed = count(candidate.reformed, "reformed")?;
    let repaired = count(candidate.repaired, "repaired")?;
    let exchanged = count(candidate.exchanged, "exchanged")?;
    let failed = count(candidate.failed, "failed")?;
    let bonuses_redeemed = count(candidate.bonuses_redeemed.unwrap_or(0), "bonusesRedeemed")?;

    let admitted = AdmittedReturn {
        date: candidate.date,
        invoice_number: candidate.invoice_number.trim().to_string(),
        reformed,
        repaired,
        exchanged,
        failed,
        bonuses_redeemed,
    };

    let requested = admitted.total_handled();
    if requested == 0 {
        return Err(AdmissionRejection::EmptySubmission);
    }

    let remaining = u64::from(ctx.shipment.quantity_sent)
        .saturating_sub(ctx.shipment.returned_excluding(ctx.replacing));
    if requested > remaining {
        return Err(AdmissionRejection::ExceedsCapacity {
            requested,
            remaining,
        });
    }

    if admitted.invoice_number.is_empty() {
        return Err(AdmissionRejection::MissingInvoice);
    }

    if ctx.used_invoices.contains(&admitted.invoice_number) {
        return Err(AdmissionRejection::DuplicateInvoice {
            invoice: admitted.invoice_number,
        });
    }

    let redeeming = u64::from(bonuses_redeemed);
    let pending = ctx.available_bonuses(reformed);
    if redeeming > pending {
        return Err(AdmissionRejection::InsufficientBonuses {
            requested: redeeming,
            pending,
        });
    }

    Ok(admitted)
}

fn count(value: i64, field: &'static str) -> Result<u32, AdmissionRejection> {
    u32::try_from(value).map_err(|_| AdmissionRejection::MalformedInput { field })
}
