//! 日志订阅器初始化
//!
//! 根据配置选择 JSON（结构化）或 pretty（人类可读）输出。

use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::ObservabilityConfig;

/// 构建环境过滤器
///
/// 优先级：RUST_LOG > 命令行覆盖 > 配置文件
pub fn build_filter(config: &ObservabilityConfig, level_override: Option<&str>) -> EnvFilter {
    let level = level_override.unwrap_or(&config.log_level);

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化 tracing 日志
///
/// 日志写到 stderr，stdout 留给命令输出。
pub fn init(config: &ObservabilityConfig, level_override: Option<&str>) -> Result<()> {
    let env_filter = build_filter(config, level_override);

    let fmt_layer = if config.json_logs() {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
