//! 对账引擎错误类型
//!
//! 定义引擎层的业务错误和存储层的系统错误

use thiserror::Error;

use crate::engine::AdmissionRejection;

/// 对账引擎错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // === 准入错误 ===
    #[error("回收记录未通过准入校验: {0}")]
    Rejected(#[from] AdmissionRejection),

    // === 远程单相关错误 ===
    #[error("远程单不存在: {0}")]
    ShipmentNotFound(String),

    #[error("回收记录不存在: shipment_id={shipment_id}, return_id={return_id}")]
    ReturnNotFound {
        shipment_id: String,
        return_id: String,
    },

    #[error("发货数量必须为正整数: {0}")]
    InvalidQuantity(i64),

    #[error("发货数量不能小于已回收数量: 新数量 {requested}, 已回收 {returned}")]
    QuantityBelowReturned { requested: u64, returned: u64 },

    #[error("当前删除策略不允许删除远程单: {0}")]
    DeletionNotAllowed(String),

    // === 用户目录错误 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("用户已存在: {0}")]
    UserAlreadyExists(String),

    // === 系统错误 ===
    #[error("快照已过期: 期望版本 {expected}, 实际版本 {actual}")]
    StaleSnapshot { expected: u64, actual: u64 },

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP 请求错误: {0}")]
    Http(#[from] reqwest::Error),
}

/// 对账引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 检查是否为可重试的错误
    ///
    /// 快照过期时重新加载后再次提交即可
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StaleSnapshot { .. } | Self::Http(_) | Self::Io(_)
        )
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::StaleSnapshot { .. }
                | Self::Storage(_)
                | Self::Io(_)
                | Self::Serialization(_)
                | Self::Http(_)
        )
    }

    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected(rejection) => rejection.code(),
            Self::ShipmentNotFound(_) => "SHIPMENT_NOT_FOUND",
            Self::ReturnNotFound { .. } => "RETURN_NOT_FOUND",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::QuantityBelowReturned { .. } => "QUANTITY_BELOW_RETURNED",
            Self::DeletionNotAllowed(_) => "DELETION_NOT_ALLOWED",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::StaleSnapshot { .. } => "STALE_SNAPSHOT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Http(_) => "HTTP_ERROR",
        }
    }
}
