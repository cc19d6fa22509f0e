//! 远程单与回收记录实体定义

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ShipmentStatus;

/// 回收记录
///
/// 一次针对远程单的回收对账，记录四种处置结果的数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnEvent {
    pub id: String,
    /// 回收处理日期
    pub date: NaiveDate,
    /// 发票号（全局唯一，忽略大小写）
    pub invoice_number: String,
    /// 翻新成功
    pub reformed: u32,
    /// 修补
    pub repaired: u32,
    /// 更换
    pub exchanged: u32,
    /// 报废
    pub failed: u32,
    /// 本次核销的奖励数量
    #[serde(default)]
    pub bonuses_redeemed: u32,
}

impl ReturnEvent {
    /// 本次回收处理的轮胎总数
    pub fn total_handled(&self) -> u64 {
        u64::from(self.reformed)
            + u64::from(self.repaired)
            + u64::from(self.exchanged)
            + u64::from(self.failed)
    }
}

/// 远程单
///
/// 一批送去翻新的轮胎，直到全部回收前持续跟踪。
/// 状态不单独存储，每次读取都由回收记录推导。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub id: String,
    /// 展示编号（REM-0001）
    pub number: String,
    pub send_date: NaiveDate,
    pub quantity_sent: u32,
    /// 回收记录，顺序仅用于展示
    pub returns: Vec<ReturnEvent>,
}

impl Shipment {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        send_date: NaiveDate,
        quantity_sent: u32,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            send_date,
            quantity_sent,
            returns: Vec::new(),
        }
    }

    /// 已回收总数
    pub fn total_returned(&self) -> u64 {
        self.returns.iter().map(ReturnEvent::total_handled).sum()
    }

    /// 除指定记录外的已回收总数（编辑时排除被编辑的记录）
    pub fn returned_excluding(&self, return_id: Option<&str>) -> u64 {
        self.returns
            .iter()
            .filter(|r| Some(r.id.as_str()) != return_id)
            .map(ReturnEvent::total_handled)
            .sum()
    }

    /// 当前状态
    pub fn status(&self) -> ShipmentStatus {
        ShipmentStatus::from_counts(self.total_returned(), u64::from(self.quantity_sent))
    }

    /// 尚未回收的数量，超量回收时为 0
    pub fn remaining(&self) -> u64 {
        u64::from(self.quantity_sent).saturating_sub(self.total_returned())
    }

    pub fn find_return(&self, return_id: &str) -> Option<&ReturnEvent> {
        self.returns.iter().find(|r| r.id == return_id)
    }

    /// 是否为一次性回收完毕（仅一条记录且恰好回收完）
    pub fn is_single_completing_receipt(&self) -> bool {
        self.returns.len() == 1 && self.total_returned() == u64::from(self.quantity_sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, reformed: u32, repaired: u32) -> ReturnEvent {
        ReturnEvent {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            invoice_number: format!("NF-{id}"),
            reformed,
            repaired,
            exchanged: 0,
            failed: 0,
            bonuses_redeemed: 0,
        }
    }

    fn shipment(quantity: u32) -> Shipment {
        Shipment::new(
            "s-1",
            "REM-0001",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            quantity,
        )
    }

    #[test]
    fn test_new_shipment_is_awaiting() {
        let s = shipment(20);
        assert_eq!(s.status(), ShipmentStatus::Awaiting);
        assert_eq!(s.total_returned(), 0);
        assert_eq!(s.remaining(), 20);
    }

    #[test]
    fn test_status_follows_returns() {
        let mut s = shipment(20);
        s.returns.push(event("r1", 10, 0));
        assert_eq!(s.status(), ShipmentStatus::Partial);

        s.returns.push(event("r2", 4, 6));
        assert_eq!(s.total_returned(), 20);
        assert_eq!(s.status(), ShipmentStatus::Finished);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn test_over_returned_stays_finished() {
        let mut s = shipment(5);
        s.returns.push(event("r1", 8, 0));
        assert_eq!(s.status(), ShipmentStatus::Finished);
        assert_eq!(s.total_returned(), 8);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn test_returned_excluding() {
        let mut s = shipment(20);
        s.returns.push(event("r1", 10, 0));
        s.returns.push(event("r2", 3, 0));
        assert_eq!(s.returned_excluding(Some("r1")), 3);
        assert_eq!(s.returned_excluding(None), 13);
        assert_eq!(s.returned_excluding(Some("missing")), 13);
    }

    #[test]
    fn test_single_completing_receipt() {
        let mut s = shipment(10);
        assert!(!s.is_single_completing_receipt());

        s.returns.push(event("r1", 10, 0));
        assert!(s.is_single_completing_receipt());

        let mut split = shipment(10);
        split.returns.push(event("r1", 5, 0));
        split.returns.push(event("r2", 5, 0));
        assert!(!split.is_single_completing_receipt());
    }
}
