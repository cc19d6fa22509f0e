//! 远程表格服务客户端
//!
//! 表格服务通过单一 URL 暴露若干 action：
//!
//! - `GET ?action=getShipments&t=<毫秒>` 读取远程单
//! - `POST {"action":"syncShipments","shipments":[...]}` 整体覆盖写入
//! - `GET ?action=getUsers`、`POST register / changePassword` 维护用户
//!
//! 表格没有版本号，写入为后写覆盖。

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::wire::{decode_shipments, encode_shipments};
use super::{ShipmentStore, Snapshot};
use crate::directory::{UserAccount, UserDirectory};
use crate::error::{EngineError, Result};
use crate::models::Shipment;

/// 表格服务客户端
#[derive(Debug, Clone)]
pub struct SheetClient {
    http: reqwest::Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_action(&self, action: &str) -> Result<Value> {
        // 时间戳参数用于绕过中间缓存
        let stamp = Utc::now().timestamp_millis().to_string();
        let value = self
            .http
            .get(&self.url)
            .query(&[("action", action), ("t", stamp.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }

    async fn post_action<T: Serialize + ?Sized>(&self, body: &T) -> Result<Value> {
        let response = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// 检查服务端返回的业务错误，形如 `{"error": "..."}` 或 `{"success": false, "message": "..."}`
fn reply_error(reply: &Value) -> Option<String> {
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Some(error.to_string());
    }
    if reply.get("success").and_then(Value::as_bool) == Some(false) {
        let message = reply
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request refused");
        return Some(message.to_string());
    }
    None
}

fn decode_users(payload: Value) -> Vec<UserAccount> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("users") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<UserAccount>(item) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Skipping malformed user entry");
                None
            }
        })
        .collect()
}

#[async_trait]
impl ShipmentStore for SheetClient {
    #[instrument(skip(self), fields(backend = "sheet"))]
    async fn load(&self) -> Result<Snapshot> {
        let payload = self.get_action("getShipments").await?;
        let shipments = decode_shipments(payload);
        debug!(shipment_count = shipments.len(), "Shipments fetched from sheet");
        Ok(Snapshot {
            shipments,
            version: None,
        })
    }

    #[instrument(skip(self, shipments), fields(backend = "sheet", shipment_count = shipments.len()))]
    async fn save(
        &self,
        shipments: &[Shipment],
        expected_version: Option<u64>,
    ) -> Result<Option<u64>> {
        if let Some(expected) = expected_version {
            debug!(expected, "Sheet store is unversioned, ignoring expected version");
        }

        let body = json!({
            "action": "syncShipments",
            "shipments": encode_shipments(shipments)?,
        });
        let reply = self.post_action(&body).await?;
        if let Some(message) = reply_error(&reply) {
            return Err(EngineError::Storage(message));
        }

        info!("Shipments synced to sheet");
        Ok(None)
    }

    fn backend(&self) -> &'static str {
        "sheet"
    }
}

#[async_trait]
impl UserDirectory for SheetClient {
    async fn list_users(&self) -> Result<Vec<UserAccount>> {
        let payload = self.get_action("getUsers").await?;
        Ok(decode_users(payload))
    }

    #[instrument(skip(self, credential_secret))]
    async fn register_user(&self, username: &str, credential_secret: &str) -> Result<()> {
        if self
            .list_users()
            .await?
            .iter()
            .any(|u| u.username == username)
        {
            return Err(EngineError::UserAlreadyExists(username.to_string()));
        }

        let body = json!({
            "action": "register",
            "user": UserAccount::new(username, credential_secret),
        });
        let reply = self.post_action(&body).await?;
        if let Some(message) = reply_error(&reply) {
            return Err(EngineError::Storage(message));
        }

        info!("User registered");
        Ok(())
    }

    #[instrument(skip(self, new_secret))]
    async fn change_credential(&self, username: &str, new_secret: &str) -> Result<()> {
        if !self
            .list_users()
            .await?
            .iter()
            .any(|u| u.username == username)
        {
            return Err(EngineError::UserNotFound(username.to_string()));
        }

        let body = json!({
            "action": "changePassword",
            "user": UserAccount::new(username, new_secret),
        });
        let reply = self.post_action(&body).await?;
        if let Some(message) = reply_error(&reply) {
            return Err(EngineError::Storage(message));
        }

        info!("User credential changed");
        Ok(())
    }
}
