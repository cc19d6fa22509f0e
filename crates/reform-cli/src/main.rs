//! Reform CLI
//!
//! 远程单对账的命令行入口点。

use anyhow::Context;
use clap::Parser;
use reform_cli::cli::{Cli, CommandRunner};
use reform_shared::{config::AppConfig, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load("reform").context("加载配置失败")?;
    observability::init(&config.observability, cli.log_level.as_deref())?;

    let runner = CommandRunner::new(config);
    runner.run(cli.command).await
}
