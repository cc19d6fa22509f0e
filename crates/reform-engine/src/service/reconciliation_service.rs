//! 对账服务
//!
//! ## 变更流程
//!
//! 1. 读取最新快照 -> 2. 引擎计算新集合（含准入校验）
//!    -> 3. 按快照版本写回 -> 4. 检查奖励变化
//!
//! 任一步失败都不会写入；版本冲突原样返回给调用方，由调用方决定是否重试。

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use reform_shared::observability::metrics;

use crate::engine::{
    statistics, AdmittedReturn, BonusWatcher, ReconciliationEngine, Removal, ShipmentCorrection,
};
use crate::error::{EngineError, Result};
use crate::models::{BonusStats, ReturnEvent, ReturnSubmission, Shipment};
use crate::service::dto::{ReturnReceipt, StatsReport};
use crate::store::ShipmentStore;

/// 对账服务
pub struct ReconciliationService {
    store: Arc<dyn ShipmentStore>,
    engine: ReconciliationEngine,
    watcher: Mutex<Option<BonusWatcher>>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn ShipmentStore>, engine: ReconciliationEngine) -> Self {
        Self {
            store,
            engine,
            watcher: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// 列出全部远程单，按存储顺序（最新在前）
    pub async fn list_shipments(&self) -> Result<Vec<Shipment>> {
        Ok(self.store.load().await?.shipments)
    }

    pub async fn get_shipment(&self, shipment_id: &str) -> Result<Shipment> {
        self.store
            .load()
            .await?
            .shipments
            .into_iter()
            .find(|s| s.id == shipment_id)
            .ok_or_else(|| EngineError::ShipmentNotFound(shipment_id.to_string()))
    }

    /// 新建远程单
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn create_shipment(&self, send_date: NaiveDate, quantity: i64) -> Result<Shipment> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);
        let (shipments, shipment) =
            self.engine
                .create_shipment(snapshot.shipments, send_date, quantity)?;
        self.commit(&shipments, snapshot.version).await?;
        self.observe_bonuses(&before, &shipments);

        info!(
            shipment_id = %shipment.id,
            number = %shipment.number,
            quantity_sent = shipment.quantity_sent,
            "Shipment created"
        );
        Ok(shipment)
    }

    /// 修正远程单发货日期或数量
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn correct_shipment(
        &self,
        shipment_id: &str,
        correction: ShipmentCorrection,
    ) -> Result<Shipment> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);
        let (shipments, shipment) =
            self.engine
                .correct_shipment(snapshot.shipments, shipment_id, correction)?;
        self.commit(&shipments, snapshot.version).await?;
        self.observe_bonuses(&before, &shipments);

        info!(
            shipment_id = %shipment.id,
            quantity_sent = shipment.quantity_sent,
            status = %shipment.status(),
            "Shipment corrected"
        );
        Ok(shipment)
    }

    /// 删除远程单，已不存在时不写入
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn delete_shipment(&self, shipment_id: &str) -> Result<Removal> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);
        let (shipments, removal) = self.engine.delete_shipment(snapshot.shipments, shipment_id)?;

        if removal == Removal::Removed {
            self.commit(&shipments, snapshot.version).await?;
            self.observe_bonuses(&before, &shipments);
            info!(shipment_id, "Shipment deleted");
        } else {
            debug!(shipment_id, "Shipment already absent");
        }
        Ok(removal)
    }

    /// 预检回收记录，不写入
    #[instrument(skip(self, submission), fields(invoice = %submission.invoice_number))]
    pub async fn check_admission(
        &self,
        shipment_id: &str,
        submission: &ReturnSubmission,
        replacing: Option<&str>,
    ) -> Result<AdmittedReturn> {
        let snapshot = self.store.load().await?;
        observe_admission(self.engine.check_admission(
            &snapshot.shipments,
            shipment_id,
            submission,
            replacing,
        ))
    }

    /// 登记回收记录
    #[instrument(
        skip(self, submission),
        fields(backend = self.store.backend(), invoice = %submission.invoice_number)
    )]
    pub async fn register_return(
        &self,
        shipment_id: &str,
        submission: &ReturnSubmission,
    ) -> Result<ReturnReceipt> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);

        let (shipments, event) = observe_admission(self.engine.register_return(
            snapshot.shipments,
            shipment_id,
            submission,
        ))?;
        self.commit(&shipments, snapshot.version).await?;

        info!(
            shipment_id,
            return_id = %event.id,
            handled = event.total_handled(),
            "Return registered"
        );
        Ok(self.receipt(shipment_id, event, &before, &shipments))
    }

    /// 编辑回收记录
    #[instrument(
        skip(self, submission),
        fields(backend = self.store.backend(), invoice = %submission.invoice_number)
    )]
    pub async fn edit_return(
        &self,
        shipment_id: &str,
        return_id: &str,
        submission: &ReturnSubmission,
    ) -> Result<ReturnReceipt> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);

        let (shipments, event) = observe_admission(self.engine.edit_return(
            snapshot.shipments,
            shipment_id,
            return_id,
            submission,
        ))?;
        self.commit(&shipments, snapshot.version).await?;

        info!(shipment_id, return_id, "Return edited");
        Ok(self.receipt(shipment_id, event, &before, &shipments))
    }

    /// 删除回收记录，已不存在时不写入
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn delete_return(&self, shipment_id: &str, return_id: &str) -> Result<Removal> {
        let snapshot = self.store.load().await?;
        let before = self.engine.stats(&snapshot.shipments);
        let (shipments, removal) =
            self.engine
                .delete_return(snapshot.shipments, shipment_id, return_id);

        if removal == Removal::Removed {
            self.commit(&shipments, snapshot.version).await?;
            self.observe_bonuses(&before, &shipments);
            info!(shipment_id, return_id, "Return deleted");
        } else {
            debug!(shipment_id, return_id, "Return already absent");
        }
        Ok(removal)
    }

    /// 全局统计
    ///
    /// 其他写入者带来的奖励变化也会在这里提醒
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<StatsReport> {
        let shipments = self.store.load().await?.shipments;
        let current = self.engine.stats(&shipments);
        let (stats, bonus_notice) = self.observe_bonuses(&current, &shipments);

        Ok(StatsReport {
            shipment_count: shipments.len(),
            breakdown: statistics::status_breakdown(&shipments),
            success_rate: stats.success_rate(),
            stats,
            bonus_notice,
        })
    }

    async fn commit(&self, shipments: &[Shipment], expected_version: Option<u64>) -> Result<()> {
        let backend = self.store.backend();
        match self.store.save(shipments, expected_version).await {
            Ok(version) => {
                metrics::record_store_write(backend, true);
                debug!(backend, ?version, "Collection written");
                Ok(())
            }
            Err(e) => {
                metrics::record_store_write(backend, false);
                warn!(backend, error = %e, retryable = e.is_retryable(), "Collection write failed");
                Err(e)
            }
        }
    }

    fn receipt(
        &self,
        shipment_id: &str,
        event: ReturnEvent,
        before: &BonusStats,
        shipments: &[Shipment],
    ) -> ReturnReceipt {
        let (stats, bonus_notice) = self.observe_bonuses(before, shipments);

        ReturnReceipt {
            shipment_id: shipment_id.to_string(),
            event,
            stats,
            bonus_notice,
        }
    }

    /// 每次提交后更新奖励提醒基线，待领取数量减少时同样跟随
    ///
    /// `before` 只在首次观察时作为基线
    fn observe_bonuses(
        &self,
        before: &BonusStats,
        shipments: &[Shipment],
    ) -> (BonusStats, Option<u64>) {
        let stats = self.engine.stats(shipments);
        metrics::record_pending_bonuses(stats.pending_bonuses);

        let bonus_notice = {
            let mut watcher = self.watcher.lock();
            watcher
                .get_or_insert_with(|| BonusWatcher::starting_from(before))
                .observe(&stats)
        };
        if let Some(available) = bonus_notice {
            metrics::record_bonus_notification();
            info!(available, "Bonus available for redemption");
        }

        (stats, bonus_notice)
    }
}

/// 记录准入结果指标，拒绝原因写入日志
fn observe_admission<T>(result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => metrics::record_admission("admitted"),
        Err(EngineError::Rejected(rejection)) => {
            metrics::record_admission(rejection.code());
            warn!(code = rejection.code(), reason = %rejection, "Return rejected");
        }
        Err(_) => {}
    }
    result
}

#[cfg(test)]
mod tests {
    use reform_shared::config::EngineConfig;

    use super::*;
    use crate::engine::AdmissionRejection;
    use crate::store::{MemoryShipmentStore, MockShipmentStore, Snapshot};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn memory_service(shipments: Vec<Shipment>) -> ReconciliationService {
        ReconciliationService::new(
            Arc::new(MemoryShipmentStore::with_shipments(shipments)),
            ReconciliationEngine::new(EngineConfig::default()),
        )
    }

    fn open_shipment() -> Shipment {
        Shipment::new("s-1", "REM-0001", ymd(2024, 3, 1), 20)
    }

    #[tokio::test]
    async fn test_register_return_persists_and_reports_stats() {
        let service = memory_service(vec![open_shipment()]);

        let receipt = service
            .register_return(
                "s-1",
                &ReturnSubmission::new(ymd(2024, 3, 10), "NF-100").reformed(15),
            )
            .await
            .unwrap();

        assert_eq!(receipt.stats.total_bonus_earned, 1);
        assert_eq!(receipt.stats.pending_bonuses, 1);
        assert_eq!(receipt.bonus_notice, Some(1));

        let stored = service.get_shipment("s-1").await.unwrap();
        assert_eq!(stored.returns, vec![receipt.event]);
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_written() {
        let mut store = MockShipmentStore::new();
        store.expect_load().returning(|| {
            Ok(Snapshot {
                shipments: vec![open_shipment()],
                version: Some(4),
            })
        });
        store.expect_save().never();
        store.expect_backend().return_const("mock");

        let service = ReconciliationService::new(Arc::new(store), ReconciliationEngine::default());
        let result = service
            .register_return(
                "s-1",
                &ReturnSubmission::new(ymd(2024, 3, 10), "NF-1").reformed(21),
            )
            .await;

        assert!(matches!(
            result,
            Err(EngineError::Rejected(AdmissionRejection::ExceedsCapacity {
                requested: 21,
                remaining: 20
            }))
        ));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_surfaced() {
        let mut store = MockShipmentStore::new();
        store.expect_load().returning(|| {
            Ok(Snapshot {
                shipments: vec![open_shipment()],
                version: Some(4),
            })
        });
        store
            .expect_save()
            .withf(|shipments, expected| shipments[0].returns.len() == 1 && *expected == Some(4))
            .times(1)
            .returning(|_, _| {
                Err(EngineError::StaleSnapshot {
                    expected: 4,
                    actual: 5,
                })
            });
        store.expect_backend().return_const("mock");

        let service = ReconciliationService::new(Arc::new(store), ReconciliationEngine::default());
        let err = service
            .register_return(
                "s-1",
                &ReturnSubmission::new(ymd(2024, 3, 10), "NF-1").repaired(2),
            )
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "STALE_SNAPSHOT");
    }

    #[tokio::test]
    async fn test_delete_absent_return_skips_write() {
        let mut store = MockShipmentStore::new();
        store.expect_load().returning(|| {
            Ok(Snapshot {
                shipments: vec![open_shipment()],
                version: None,
            })
        });
        store.expect_save().never();
        store.expect_backend().return_const("mock");

        let service = ReconciliationService::new(Arc::new(store), ReconciliationEngine::default());
        let removal = service.delete_return("s-1", "missing").await.unwrap();
        assert_eq!(removal, Removal::AlreadyAbsent);
    }

    #[tokio::test]
    async fn test_bonus_notice_only_on_increase() {
        let service = memory_service(vec![Shipment::new("s-1", "REM-0001", ymd(2024, 3, 1), 40)]);

        let first = service
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 2), "A").reformed(10))
            .await
            .unwrap();
        assert_eq!(first.bonus_notice, None);

        let second = service
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 3), "B").reformed(5))
            .await
            .unwrap();
        assert_eq!(second.bonus_notice, Some(1));

        let redeemed = service
            .register_return(
                "s-1",
                &ReturnSubmission::new(ymd(2024, 3, 4), "C").repaired(1).redeeming(1),
            )
            .await
            .unwrap();
        assert_eq!(redeemed.stats.pending_bonuses, 0);
        assert_eq!(redeemed.bonus_notice, None);
    }

    #[tokio::test]
    async fn test_bonus_notice_again_after_delete() {
        let service = memory_service(vec![Shipment::new("s-1", "REM-0001", ymd(2024, 3, 1), 40)]);

        let first = service
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 2), "A").reformed(15))
            .await
            .unwrap();
        assert_eq!(first.bonus_notice, Some(1));

        service.delete_return("s-1", &first.event.id).await.unwrap();

        let second = service
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 3), "B").reformed(15))
            .await
            .unwrap();
        assert_eq!(second.stats.pending_bonuses, 1);
        assert_eq!(second.bonus_notice, Some(1));
    }

    #[tokio::test]
    async fn test_stats_notices_bonus_from_other_writer() {
        let store = Arc::new(MemoryShipmentStore::with_shipments(vec![open_shipment()]));
        let service = ReconciliationService::new(store.clone(), ReconciliationEngine::default());
        let other = ReconciliationService::new(store, ReconciliationEngine::default());

        assert_eq!(service.stats().await.unwrap().bonus_notice, None);

        other
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 2), "A").reformed(15))
            .await
            .unwrap();

        let report = service.stats().await.unwrap();
        assert_eq!(report.bonus_notice, Some(1));
        assert_eq!(service.stats().await.unwrap().bonus_notice, None);
    }

    #[tokio::test]
    async fn test_stats_report() {
        let service = memory_service(vec![open_shipment()]);
        service
            .register_return("s-1", &ReturnSubmission::new(ymd(2024, 3, 2), "A").reformed(3).failed(1))
            .await
            .unwrap();

        let report = service.stats().await.unwrap();
        assert_eq!(report.shipment_count, 1);
        assert_eq!(report.breakdown.partial, 1);
        assert_eq!(report.stats.total_returned(), 4);
        assert!((report.success_rate - 75.0).abs() < f64::EPSILON);
    }
}
