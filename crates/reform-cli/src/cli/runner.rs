//! 命令执行器
//!
//! 根据配置构建存储和服务，执行各子命令并输出结果。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use reform_engine::{
    FileShipmentStore, MemoryShipmentStore, MemoryUserDirectory, ReconciliationEngine,
    ReconciliationService, Removal, ReturnReceipt, SheetClient, Shipment, ShipmentCorrection,
    ShipmentStore, UserDirectory,
};
use reform_shared::config::{AppConfig, StoreBackend};

use super::commands::{Commands, ReturnCommand, ShipmentCommand, UserCommand};

/// 命令执行器
pub struct CommandRunner {
    config: AppConfig,
}

impl CommandRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Shipment(command) => self.run_shipment(command).await,
            Commands::Return(command) => self.run_return(command).await,
            Commands::Stats { json } => self.run_stats(json).await,
            Commands::Users(command) => self.run_users(command).await,
        }
    }

    /// 按配置构建远程单存储
    pub fn build_store(&self) -> Result<Arc<dyn ShipmentStore>> {
        let store = &self.config.store;
        let built: Arc<dyn ShipmentStore> = match store.backend {
            StoreBackend::File => Arc::new(FileShipmentStore::new(&store.file_path)),
            StoreBackend::Sheet => Arc::new(self.sheet_client()?),
            StoreBackend::Memory => {
                warn!("Memory backend selected, changes are discarded on exit");
                Arc::new(MemoryShipmentStore::new())
            }
        };

        info!(backend = built.backend(), "Store ready");
        Ok(built)
    }

    /// 按配置构建用户目录
    pub fn build_directory(&self) -> Result<Arc<dyn UserDirectory>> {
        match self.config.store.backend {
            StoreBackend::Sheet => Ok(Arc::new(self.sheet_client()?)),
            StoreBackend::Memory => Ok(Arc::new(MemoryUserDirectory::default())),
            StoreBackend::File => bail!("用户目录需要 sheet 存储后端"),
        }
    }

    fn sheet_client(&self) -> Result<SheetClient> {
        let store = &self.config.store;
        let url = store
            .sheet_url
            .as_deref()
            .context("sheet 后端需要配置 store.sheet_url")?;

        SheetClient::new(url, Duration::from_secs(store.request_timeout_seconds))
            .context("创建表格客户端失败")
    }

    fn service(&self) -> Result<ReconciliationService> {
        Ok(ReconciliationService::new(
            self.build_store()?,
            ReconciliationEngine::new(self.config.engine.clone()),
        ))
    }

    async fn run_shipment(&self, command: ShipmentCommand) -> Result<()> {
        let service = self.service()?;

        match command {
            ShipmentCommand::Create { date, quantity } => {
                let shipment = service
                    .create_shipment(date, quantity)
                    .await
                    .context("新建远程单失败")?;
                println!("已新建远程单 {} ({})", shipment.number, shipment.id);
            }
            ShipmentCommand::Correct {
                shipment_id,
                date,
                quantity,
            } => {
                let correction = ShipmentCorrection {
                    send_date: date,
                    quantity_sent: quantity,
                };
                let shipment = service
                    .correct_shipment(&shipment_id, correction)
                    .await
                    .context("修正远程单失败")?;
                print_shipments(std::slice::from_ref(&shipment));
            }
            ShipmentCommand::Delete { shipment_id } => {
                let removal = service
                    .delete_shipment(&shipment_id)
                    .await
                    .context("删除远程单失败")?;
                print_removal("远程单", removal);
            }
            ShipmentCommand::List { json } => {
                let shipments = service.list_shipments().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&shipments_json(&shipments)?)?);
                } else {
                    print_shipments(&shipments);
                }
            }
        }

        Ok(())
    }

    async fn run_return(&self, command: ReturnCommand) -> Result<()> {
        let service = self.service()?;

        match command {
            ReturnCommand::Add { shipment_id, args } => {
                let receipt = service
                    .register_return(&shipment_id, &args.to_submission())
                    .await
                    .context("登记回收记录失败")?;
                print_receipt("已登记", &receipt);
            }
            ReturnCommand::Edit {
                shipment_id,
                return_id,
                args,
            } => {
                let receipt = service
                    .edit_return(&shipment_id, &return_id, &args.to_submission())
                    .await
                    .context("编辑回收记录失败")?;
                print_receipt("已更新", &receipt);
            }
            ReturnCommand::Delete {
                shipment_id,
                return_id,
            } => {
                let removal = service
                    .delete_return(&shipment_id, &return_id)
                    .await
                    .context("删除回收记录失败")?;
                print_removal("回收记录", removal);
            }
            ReturnCommand::Check {
                shipment_id,
                replacing,
                args,
            } => {
                let admitted = service
                    .check_admission(&shipment_id, &args.to_submission(), replacing.as_deref())
                    .await
                    .context("回收记录未通过校验")?;
                println!(
                    "可以提交: 发票 {}, 共 {} 条",
                    admitted.invoice_number,
                    admitted.total_handled()
                );
            }
        }

        Ok(())
    }

    async fn run_stats(&self, json: bool) -> Result<()> {
        let report = self.service()?.stats().await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let stats = &report.stats;
        println!("\n全局统计:");
        println!("{}", "-".repeat(40));
        println!("远程单数量: {}", report.shipment_count);
        println!(
            "等待回收 / 部分回收 / 已完结: {} / {} / {}",
            report.breakdown.awaiting, report.breakdown.partial, report.breakdown.finished
        );
        println!("发货总数: {}", stats.total_sent);
        println!("翻新: {}", stats.total_reformed);
        println!("修补: {}", stats.total_repaired);
        println!("更换: {}", stats.total_exchanged);
        println!("失败: {}", stats.total_failed);
        println!("成功率: {:.1}%", report.success_rate);
        println!("已获得奖励: {}", stats.total_bonus_earned);
        println!("已核销奖励: {}", stats.total_bonus_paid);
        println!("待领取奖励: {}", stats.pending_bonuses);
        println!(
            "下一次奖励进度: {}/{}",
            stats.bonus_progress, stats.bonus_threshold
        );
        println!("{}", "-".repeat(40));
        if let Some(available) = report.bonus_notice {
            println!("新的奖励已到账，当前可领取 {available} 个");
        }

        Ok(())
    }

    async fn run_users(&self, command: UserCommand) -> Result<()> {
        let directory = self.build_directory()?;

        match command {
            UserCommand::List => {
                for user in directory.list_users().await? {
                    println!("{}", user.username);
                }
            }
            UserCommand::Register { username, password } => {
                directory
                    .register_user(&username, &password)
                    .await
                    .context("注册用户失败")?;
                println!("已注册用户 {username}");
            }
            UserCommand::Passwd { username, password } => {
                directory
                    .change_credential(&username, &password)
                    .await
                    .context("修改密码失败")?;
                println!("已修改用户 {username} 的密码");
            }
        }

        Ok(())
    }
}

fn shipments_json(shipments: &[Shipment]) -> Result<serde_json::Value> {
    Ok(reform_engine::store::wire::encode_shipments(shipments)?)
}

fn print_shipments(shipments: &[Shipment]) {
    if shipments.is_empty() {
        println!("暂无远程单");
        return;
    }

    println!(
        "{:<10} {:<12} {:>6} {:>6}  {:<20} {}",
        "编号", "发货日期", "发货", "回收", "状态", "ID"
    );
    for shipment in shipments {
        println!(
            "{:<10} {:<12} {:>6} {:>6}  {:<20} {}",
            shipment.number,
            shipment.send_date.to_string(),
            shipment.quantity_sent,
            shipment.total_returned(),
            shipment.status().label(),
            shipment.id
        );
    }
}

fn print_receipt(action: &str, receipt: &ReturnReceipt) {
    let event = &receipt.event;
    println!(
        "{action}回收记录 {} (发票 {}): 翻新 {}, 修补 {}, 更换 {}, 失败 {}",
        event.id, event.invoice_number, event.reformed, event.repaired, event.exchanged, event.failed
    );
    println!("待领取奖励: {}", receipt.stats.pending_bonuses);
    if let Some(available) = receipt.bonus_notice {
        println!("新的奖励已到账，当前可领取 {available} 个");
    }
}

fn print_removal(subject: &str, removal: Removal) {
    match removal {
        Removal::Removed => println!("已删除{subject}"),
        Removal::AlreadyAbsent => println!("{subject}不存在，无需删除"),
    }
}
