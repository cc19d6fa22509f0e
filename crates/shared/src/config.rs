//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 存储后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// 本地 JSON 文件（带版本号）
    #[default]
    File,
    /// 远端表格脚本接口
    Sheet,
    /// 进程内存（仅用于测试和演示）
    Memory,
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// 文件后端的数据文件路径
    pub file_path: PathBuf,
    /// 表格脚本的发布地址
    pub sheet_url: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            file_path: PathBuf::from("data/shipments.json"),
            sheet_url: None,
            request_timeout_seconds: 30,
        }
    }
}

/// 整批删除远程单的准入策略
///
/// 由展示层决定，引擎只负责按配置执行
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// 仅当只有一条回收记录且恰好回收完毕时允许删除
    #[default]
    SingleCompletingReceipt,
    /// 未完结前均可删除
    UnlessFinished,
    /// 不做限制
    Always,
}

/// 发货数量非正时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityPolicy {
    /// 直接拒绝
    #[default]
    Reject,
    /// 修正为 1
    Clamp,
}

/// 对账引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 每累计多少条翻新产生一次奖励
    pub bonus_threshold: u32,
    pub deletion_policy: DeletionPolicy,
    pub non_positive_quantity: QuantityPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bonus_threshold: 15,
            deletion_policy: DeletionPolicy::default(),
            non_positive_quantity: QuantityPolicy::default(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. 环境变量（REFORM_ 前缀，双下划线分隔层级，如 REFORM_STORE__BACKEND -> store.backend）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("REFORM_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                Environment::with_prefix("REFORM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.bonus_threshold, 15);
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(
            config.engine.deletion_policy,
            DeletionPolicy::SingleCompletingReceipt
        );
        assert!(!config.observability.json_logs());
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("reform-config-{}", std::process::id()));
        let config = AppConfig::load_from("reform", "test", &dir).unwrap();

        assert_eq!(config.service_name, "reform");
        assert_eq!(config.environment, "test");
        assert_eq!(config.engine.non_positive_quantity, QuantityPolicy::Reject);
        assert!(!config.is_production());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("reform-config-toml-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            r#"
[store]
backend = "sheet"
sheet_url = "https://example.invalid/exec"

[engine]
bonus_threshold = 10
deletion_policy = "unless_finished"
non_positive_quantity = "clamp"

[observability]
log_format = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from("reform", "development", &dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(config.store.backend, StoreBackend::Sheet);
        assert_eq!(
            config.store.sheet_url.as_deref(),
            Some("https://example.invalid/exec")
        );
        assert_eq!(config.store.request_timeout_seconds, 30);
        assert_eq!(config.engine.bonus_threshold, 10);
        assert_eq!(config.engine.deletion_policy, DeletionPolicy::UnlessFinished);
        assert_eq!(config.engine.non_positive_quantity, QuantityPolicy::Clamp);
        assert!(config.observability.json_logs());
    }
}
