//! 统一可观测性模块
//!
//! 所有入口通过单一入口点初始化日志和指标描述，确保一致的输出格式和过滤规则。

pub mod metrics;
pub mod tracing;

use ::tracing::debug;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 统一初始化可观测性
///
/// `level_override` 用于命令行参数覆盖配置中的日志级别，
/// 环境变量 `RUST_LOG` 的优先级最高。
///
/// # Example
///
/// ```ignore
/// use reform_shared::{config::AppConfig, observability};
///
/// let config = AppConfig::load("reform")?;
/// observability::init(&config.observability, None)?;
/// ```
pub fn init(config: &ObservabilityConfig, level_override: Option<&str>) -> Result<()> {
    tracing::init(config, level_override)?;
    metrics::describe();

    debug!(
        log_level = %config.log_level,
        json_logs = config.json_logs(),
        "Observability initialized"
    );

    Ok(())
}
