//! 用户目录
//!
//! 登录鉴权不在对账引擎范围内，这里只维护用户列表。
//! 引擎从不读取凭据内容。

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::MemoryUserDirectory;

/// 用户账户
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    #[serde(rename = "password")]
    pub credential_secret: String,
}

impl UserAccount {
    pub fn new(username: impl Into<String>, credential_secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credential_secret: credential_secret.into(),
        }
    }
}

impl std::fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAccount")
            .field("username", &self.username)
            .field("credential_secret", &"***")
            .finish()
    }
}

/// 用户目录接口
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserAccount>>;
    async fn register_user(&self, username: &str, credential_secret: &str) -> Result<()>;
    async fn change_credential(&self, username: &str, new_secret: &str) -> Result<()>;
}
