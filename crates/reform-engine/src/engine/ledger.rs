//! 远程单集合操作
//!
//! 所有操作都接收完整的远程单集合，返回替换后的完整集合。
//! 引擎本身不持有状态，也不访问存储。

use chrono::NaiveDate;
use reform_shared::config::{DeletionPolicy, EngineConfig, QuantityPolicy};
use uuid::Uuid;

use super::admission::{admit, AdmissionContext, AdmittedReturn, InvoiceIndex};
use super::statistics;
use crate::error::{EngineError, Result};
use crate::models::{BonusStats, ReturnEvent, ReturnSubmission, Shipment, ShipmentStatus};

/// 展示编号前缀
pub const SHIPMENT_NUMBER_PREFIX: &str = "REM-";

/// 幂等删除的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// 远程单修正内容，未设置的字段保持不变
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipmentCorrection {
    pub send_date: Option<NaiveDate>,
    pub quantity_sent: Option<i64>,
}

/// 对账引擎
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: EngineConfig,
}

impl ReconciliationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 全局奖励统计
    pub fn stats(&self, shipments: &[Shipment]) -> BonusStats {
        statistics::fold(shipments, self.config.bonus_threshold)
    }

    /// 新建远程单，插入到集合最前面
    pub fn create_shipment(
        &self,
        mut shipments: Vec<Shipment>,
        send_date: NaiveDate,
        quantity: i64,
    ) -> Result<(Vec<Shipment>, Shipment)> {
        let quantity_sent = self.sanitize_quantity(quantity)?;
        let shipment = Shipment::new(
            Uuid::new_v4().to_string(),
            next_shipment_number(&shipments),
            send_date,
            quantity_sent,
        );

        shipments.insert(0, shipment.clone());
        Ok((shipments, shipment))
    }

    /// 准入校验（不修改集合）
    ///
    /// `replacing` 为被编辑的记录 ID，其发票号和数量不参与校验
    pub fn check_admission(
        &self,
        shipments: &[Shipment],
        shipment_id: &str,
        submission: &ReturnSubmission,
        replacing: Option<&str>,
    ) -> Result<AdmittedReturn> {
        let shipment = find_shipment(shipments, shipment_id)?;

        if let Some(return_id) = replacing {
            if shipment.find_return(return_id).is_none() {
                return Err(EngineError::ReturnNotFound {
                    shipment_id: shipment_id.to_string(),
                    return_id: return_id.to_string(),
                });
            }
        }

        let used_invoices = InvoiceIndex::from_shipments(shipments, replacing);
        let others = statistics::tally_excluding(shipments, replacing);

        let admitted = admit(
            submission,
            &AdmissionContext {
                shipment,
                used_invoices: &used_invoices,
                replacing,
                others,
                bonus_threshold: self.config.bonus_threshold,
            },
        )?;

        Ok(admitted)
    }

    /// 登记新的回收记录
    pub fn register_return(
        &self,
        mut shipments: Vec<Shipment>,
        shipment_id: &str,
        submission: &ReturnSubmission,
    ) -> Result<(Vec<Shipment>, ReturnEvent)> {
        let admitted = self.check_admission(&shipments, shipment_id, submission, None)?;
        let event = admitted.into_event(Uuid::new_v4().to_string());

        find_shipment_mut(&mut shipments, shipment_id)?
            .returns
            .push(event.clone());

        Ok((shipments, event))
    }

    /// 编辑回收记录，保留原记录 ID 和位置
    pub fn edit_return(
        &self,
        mut shipments: Vec<Shipment>,
        shipment_id: &str,
        return_id: &str,
        submission: &ReturnSubmission,
    ) -> Result<(Vec<Shipment>, ReturnEvent)> {
        let admitted =
            self.check_admission(&shipments, shipment_id, submission, Some(return_id))?;
        let event = admitted.into_event(return_id);

        let shipment = find_shipment_mut(&mut shipments, shipment_id)?;
        if let Some(slot) = shipment.returns.iter_mut().find(|r| r.id == return_id) {
            *slot = event.clone();
        }

        Ok((shipments, event))
    }

    /// 删除回收记录，记录或远程单已不存在时为空操作
    pub fn delete_return(
        &self,
        mut shipments: Vec<Shipment>,
        shipment_id: &str,
        return_id: &str,
    ) -> (Vec<Shipment>, Removal) {
        let removal = match shipments.iter_mut().find(|s| s.id == shipment_id) {
            Some(shipment) => {
                let before = shipment.returns.len();
                shipment.returns.retain(|r| r.id != return_id);
                if shipment.returns.len() < before {
                    Removal::Removed
                } else {
                    Removal::AlreadyAbsent
                }
            }
            None => Removal::AlreadyAbsent,
        };

        (shipments, removal)
    }

    /// 修正远程单的发货日期或数量
    ///
    /// 新数量不能小于已回收数量
    pub fn correct_shipment(
        &self,
        mut shipments: Vec<Shipment>,
        shipment_id: &str,
        correction: ShipmentCorrection,
    ) -> Result<(Vec<Shipment>, Shipment)> {
        let quantity = correction
            .quantity_sent
            .map(|q| self.sanitize_quantity(q))
            .transpose()?;

        let shipment = find_shipment_mut(&mut shipments, shipment_id)?;

        if let Some(quantity) = quantity {
            let returned = shipment.total_returned();
            if u64::from(quantity) < returned {
                return Err(EngineError::QuantityBelowReturned {
                    requested: u64::from(quantity),
                    returned,
                });
            }
            shipment.quantity_sent = quantity;
        }
        if let Some(send_date) = correction.send_date {
            shipment.send_date = send_date;
        }

        let updated = shipment.clone();
        Ok((shipments, updated))
    }

    /// 删除整个远程单，受删除策略约束
    pub fn delete_shipment(
        &self,
        mut shipments: Vec<Shipment>,
        shipment_id: &str,
    ) -> Result<(Vec<Shipment>, Removal)> {
        let Some(position) = shipments.iter().position(|s| s.id == shipment_id) else {
            return Ok((shipments, Removal::AlreadyAbsent));
        };

        if !self.deletion_allowed(&shipments[position]) {
            return Err(EngineError::DeletionNotAllowed(
                shipments[position].number.clone(),
            ));
        }

        shipments.remove(position);
        Ok((shipments, Removal::Removed))
    }

    /// 当前删除策略下是否允许删除
    pub fn deletion_allowed(&self, shipment: &Shipment) -> bool {
        match self.config.deletion_policy {
            DeletionPolicy::SingleCompletingReceipt => shipment.is_single_completing_receipt(),
            DeletionPolicy::UnlessFinished => shipment.status() != ShipmentStatus::Finished,
            DeletionPolicy::Always => true,
        }
    }

    fn sanitize_quantity(&self, quantity: i64) -> Result<u32> {
        if quantity <= 0 {
            return match self.config.non_positive_quantity {
                QuantityPolicy::Reject => Err(EngineError::InvalidQuantity(quantity)),
                QuantityPolicy::Clamp => Ok(1),
            };
        }
        u32::try_from(quantity).map_err(|_| EngineError::InvalidQuantity(quantity))
    }
}

/// 生成下一个展示编号
///
/// 取现有编号数字后缀的最大值加 1，删除中间的远程单不会导致编号重复
pub fn next_shipment_number(shipments: &[Shipment]) -> String {
    let next = shipments
        .iter()
        .filter_map(|s| numeric_suffix(&s.number))
        .max()
        .unwrap_or(0)
        + 1;

    format!("{SHIPMENT_NUMBER_PREFIX}{next:04}")
}

fn numeric_suffix(number: &str) -> Option<u64> {
    let digits_start = number
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;

    number[digits_start..].parse().ok()
}

fn find_shipment<'a>(shipments: &'a [Shipment], shipment_id: &str) -> Result<&'a Shipment> {
    shipments
        .iter()
        .find(|s| s.id == shipment_id)
        .ok_or_else(|| EngineError::ShipmentNotFound(shipment_id.to_string()))
}

fn find_shipment_mut<'a>(
    shipments: &'a mut [Shipment],
    shipment_id: &str,
) -> Result<&'a mut Shipment> {
    shipments
        .iter_mut()
        .find(|s| s.id == shipment_id)
        .ok_or_else(|| EngineError::ShipmentNotFound(shipment_id.to_string()))
}
