//! 内存用户目录

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{UserAccount, UserDirectory};
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<UserAccount>>,
}

impl MemoryUserDirectory {
    pub fn new(users: Vec<UserAccount>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn list_users(&self) -> Result<Vec<UserAccount>> {
        Ok(self.users.read().clone())
    }

    async fn register_user(&self, username: &str, credential_secret: &str) -> Result<()> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.username == username) {
            return Err(EngineError::UserAlreadyExists(username.to_string()));
        }
        users.push(UserAccount::new(username, credential_secret));
        Ok(())
    }

    async fn change_credential(&self, username: &str, new_secret: &str) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| EngineError::UserNotFound(username.to_string()))?;
        user.credential_secret = new_secret.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_change_credential() {
        let directory = MemoryUserDirectory::default();
        directory.register_user("joao", "1").await.unwrap();

        let result = directory.register_user("joao", "2").await;
        assert!(matches!(result, Err(EngineError::UserAlreadyExists(_))));

        directory.change_credential("joao", "9").await.unwrap();
        let users = directory.list_users().await.unwrap();
        assert_eq!(users, vec![UserAccount::new("joao", "9")]);

        let result = directory.change_credential("ana", "1").await;
        assert!(matches!(result, Err(EngineError::UserNotFound(_))));
    }
}
