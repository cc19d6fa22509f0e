//! 远程单枚举类型定义

use serde::{Deserialize, Serialize};

/// 远程单状态
///
/// 始终由回收数量推导，存储中的值只是缓存
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    /// 等待回收 - 尚未回收任何轮胎
    #[default]
    #[serde(rename = "Aguardando Retorno")]
    Awaiting,
    /// 部分回收
    #[serde(rename = "Retorno Parcial")]
    Partial,
    /// 已完结 - 回收数量达到发货数量
    #[serde(rename = "Finalizada")]
    Finished,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 3] = [Self::Awaiting, Self::Partial, Self::Finished];

    /// 根据已回收数量与发货数量推导状态
    ///
    /// 回收为 0 时优先判定为等待回收，超量回收仍判定为已完结
    pub fn from_counts(returned: u64, sent: u64) -> Self {
        if returned == 0 {
            Self::Awaiting
        } else if returned >= sent {
            Self::Finished
        } else {
            Self::Partial
        }
    }

    /// 存储格式中使用的标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Awaiting => "Aguardando Retorno",
            Self::Partial => "Retorno Parcial",
            Self::Finished => "Finalizada",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Awaiting => "AWAITING",
            Self::Partial => "PARTIAL",
            Self::Finished => "FINISHED",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
