//! 回收提交请求
//!
//! 外部提交的原始数值，尚未经过准入校验，因此使用有符号整数承载

use chrono::NaiveDate;
use serde::Deserialize;

/// 待准入的回收记录
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSubmission {
    pub date: NaiveDate,
    pub invoice_number: String,
    #[serde(default)]
    pub reformed: i64,
    #[serde(default)]
    pub repaired: i64,
    #[serde(default)]
    pub exchanged: i64,
    #[serde(default)]
    pub failed: i64,
    #[serde(default)]
    pub bonuses_redeemed: Option<i64>,
}

impl ReturnSubmission {
    pub fn new(date: NaiveDate, invoice_number: impl Into<String>) -> Self {
        Self {
            date,
            invoice_number: invoice_number.into(),
            reformed: 0,
            repaired: 0,
            exchanged: 0,
            failed: 0,
            bonuses_redeemed: None,
        }
    }

    pub fn reformed(mut self, count: i64) -> Self {
        self.reformed = count;
        self
    }

    pub fn repaired(mut self, count: i64) -> Self {
        self.repaired = count;
        self
    }

    pub fn exchanged(mut self, count: i64) -> Self {
        self.exchanged = count;
        self
    }

    pub fn failed(mut self, count: i64) -> Self {
        self.failed = count;
        self
    }

    pub fn redeeming(mut self, bonuses: i64) -> Self {
        self.bonuses_redeemed = Some(bonuses);
        self
    }
}
