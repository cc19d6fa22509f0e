//! 存储格式编解码
//!
//! 写出时使用固定的 camelCase 结构；读取时尽量容错：
//!
//! - 顶层可以是 `{ "shipments": [...] }` 或数组
//! - `returns` 可以是数组、JSON 字符串，缺失或其他类型视为空
//! - 数值可以是数字或数字字符串，负数和非数字按 0 处理，小数截断
//! - 存储中的 `status` 忽略，读取后重新推导

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ReturnEvent, Shipment, ShipmentStatus};

/// 存储格式的远程单
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord<'a> {
    pub id: &'a str,
    pub number: &'a str,
    pub send_date: NaiveDate,
    pub quantity_sent: u32,
    pub status: ShipmentStatus,
    pub returns: &'a [ReturnEvent],
}

impl<'a> From<&'a Shipment> for ShipmentRecord<'a> {
    fn from(shipment: &'a Shipment) -> Self {
        Self {
            id: &shipment.id,
            number: &shipment.number,
            send_date: shipment.send_date,
            quantity_sent: shipment.quantity_sent,
            status: shipment.status(),
            returns: &shipment.returns,
        }
    }
}

/// 编码远程单集合
pub fn encode_shipments(shipments: &[Shipment]) -> Result<Value> {
    let records: Vec<ShipmentRecord<'_>> = shipments.iter().map(ShipmentRecord::from).collect();
    Ok(serde_json::to_value(records)?)
}

/// 编码带版本号的快照
pub fn encode_snapshot(shipments: &[Shipment], version: u64) -> Result<Value> {
    Ok(json!({
        "version": version,
        "shipments": encode_shipments(shipments)?,
    }))
}

/// 解码带版本号的快照，缺少版本号时为 0
pub fn decode_snapshot(payload: Value) -> (Vec<Shipment>, u64) {
    let version = payload
        .get("version")
        .map(|v| u64::from(coerce_count(Some(v))))
        .unwrap_or(0);

    (decode_shipments(payload), version)
}

/// 解码远程单集合
pub fn decode_shipments(payload: Value) -> Vec<Shipment> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("shipments") {
            Some(Value::Array(items)) => items,
            _ => {
                warn!("Payload has no shipments array, treating as empty");
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        other => {
            warn!(kind = %value_kind(&other), "Unexpected shipments payload, treating as empty");
            Vec::new()
        }
    };

    items.iter().filter_map(decode_shipment).collect()
}

fn decode_shipment(value: &Value) -> Option<Shipment> {
    if !value.is_object() {
        warn!(kind = %value_kind(value), "Skipping non-object shipment entry");
        return None;
    }

    let mut shipment = Shipment::new(
        id_or_generate(value.get("id")),
        text(value.get("number")),
        date(value.get("sendDate")),
        coerce_count(value.get("quantitySent")),
    );
    shipment.returns = decode_returns(value.get("returns"));

    Some(shipment)
}

fn decode_returns(value: Option<&Value>) -> Vec<ReturnEvent> {
    let items = match value {
        Some(Value::Array(items)) => items.clone(),
        // 部分快照中 returns 被编码成了 JSON 字符串
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            _ => {
                warn!("Undecodable returns string, treating as empty");
                Vec::new()
            }
        },
        _ => Vec::new(),
    };

    items.iter().filter_map(decode_return).collect()
}

fn decode_return(value: &Value) -> Option<ReturnEvent> {
    if !value.is_object() {
        warn!(kind = %value_kind(value), "Skipping non-object return entry");
        return None;
    }

    Some(ReturnEvent {
        id: id_or_generate(value.get("id")),
        date: date(value.get("date")),
        invoice_number: text(value.get("invoiceNumber")),
        reformed: coerce_count(value.get("reformed")),
        repaired: coerce_count(value.get("repaired")),
        exchanged: coerce_count(value.get("exchanged")),
        failed: coerce_count(value.get("failed")),
        bonuses_redeemed: coerce_count(value.get("bonusesRedeemed")),
    })
}

/// 将任意 JSON 值转换为非负计数
pub fn coerce_count(value: Option<&Value>) -> u32 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn id_or_generate(value: Option<&Value>) -> String {
    let id = text(value);
    if id.trim().is_empty() {
        let generated = Uuid::new_v4().to_string();
        warn!(generated = %generated, "Entry without id, assigned a new one");
        return generated;
    }
    id
}

/// 解析日期，兼容 ISO 时间戳前缀；无法解析时退回 1970-01-01
fn date(value: Option<&Value>) -> NaiveDate {
    let raw = text(value);
    let prefix = raw.trim().get(..10).unwrap_or(raw.trim());

    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").unwrap_or_else(|_| {
        if !raw.is_empty() {
            warn!(raw = %raw, "Unparseable date, falling back to epoch");
        }
        NaiveDate::default()
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decode_wrapped_payload_with_string_returns() {
        let payload = json!({
            "shipments": [{
                "id": "s-1",
                "number": "REM-0001",
                "sendDate": "2024-05-01T03:00:00.000Z",
                "quantitySent": "20",
                "status": "Finalizada",
                "returns": "[{\"id\":\"r-1\",\"date\":\"2024-05-10\",\"invoiceNumber\":\"NF-1\",\"reformed\":10,\"repaired\":\"2\",\"exchanged\":null,\"failed\":-3}]"
            }]
        });

        let shipments = decode_shipments(payload);
        assert_eq!(shipments.len(), 1);

        let s = &shipments[0];
        assert_eq!(s.send_date, ymd(2024, 5, 1));
        assert_eq!(s.quantity_sent, 20);
        // 存储中的状态被忽略
        assert_eq!(s.status(), ShipmentStatus::Partial);

        let r = &s.returns[0];
        assert_eq!(r.id, "r-1");
        assert_eq!(r.reformed, 10);
        assert_eq!(r.repaired, 2);
        assert_eq!(r.exchanged, 0);
        assert_eq!(r.failed, 0);
        assert_eq!(r.bonuses_redeemed, 0);
    }

    #[test]
    fn test_decode_bare_array_and_missing_returns() {
        let payload = json!([
            { "id": "s-1", "number": "REM-0001", "sendDate": "2024-05-01", "quantitySent": 5 },
            { "id": "s-2", "number": "REM-0002", "sendDate": "2024-05-02", "quantitySent": 5, "returns": 42 },
            "garbage"
        ]);

        let shipments = decode_shipments(payload);
        assert_eq!(shipments.len(), 2);
        assert!(shipments.iter().all(|s| s.returns.is_empty()));
    }

    #[test]
    fn test_decode_unexpected_payload_is_empty() {
        assert!(decode_shipments(json!("nope")).is_empty());
        assert!(decode_shipments(json!({ "error": "boom" })).is_empty());
        assert!(decode_shipments(Value::Null).is_empty());
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count(Some(&json!(7))), 7);
        assert_eq!(coerce_count(Some(&json!(7.9))), 7);
        assert_eq!(coerce_count(Some(&json!(-1))), 0);
        assert_eq!(coerce_count(Some(&json!(" 12 "))), 12);
        assert_eq!(coerce_count(Some(&json!("abc"))), 0);
        assert_eq!(coerce_count(Some(&json!(true))), 0);
        assert_eq!(coerce_count(None), 0);
    }

    #[test]
    fn test_unparseable_date_falls_back_to_epoch() {
        let payload = json!([{ "id": "s-1", "number": "REM-0001", "sendDate": "ontem", "quantitySent": 1 }]);
        let shipments = decode_shipments(payload);
        assert_eq!(shipments[0].send_date, NaiveDate::default());
    }

    #[test]
    fn test_missing_ids_are_generated() {
        let payload = json!([{ "number": "REM-0001", "sendDate": "2024-05-01", "quantitySent": 1,
                               "returns": [{ "invoiceNumber": "NF-1", "reformed": 1 }] }]);
        let shipments = decode_shipments(payload);
        assert!(Uuid::parse_str(&shipments[0].id).is_ok());
        assert!(Uuid::parse_str(&shipments[0].returns[0].id).is_ok());
    }

    #[test]
    fn test_encode_writes_derived_status_and_camel_case() {
        let mut shipment = Shipment::new("s-1", "REM-0001", ymd(2024, 5, 1), 10);
        shipment.returns.push(ReturnEvent {
            id: "r-1".to_string(),
            date: ymd(2024, 5, 3),
            invoice_number: "NF-1".to_string(),
            reformed: 10,
            repaired: 0,
            exchanged: 0,
            failed: 0,
            bonuses_redeemed: 0,
        });

        let value = encode_shipments(std::slice::from_ref(&shipment)).unwrap();
        assert_eq!(value[0]["status"], "Finalizada");
        assert_eq!(value[0]["sendDate"], "2024-05-01");
        assert_eq!(value[0]["quantitySent"], 10);
        assert_eq!(value[0]["returns"][0]["invoiceNumber"], "NF-1");
        assert_eq!(value[0]["returns"][0]["bonusesRedeemed"], 0);

        let decoded = decode_shipments(value);
        assert_eq!(decoded, vec![shipment]);
    }

    #[test]
    fn test_snapshot_version() {
        let value = encode_snapshot(&[], 7).unwrap();
        let (shipments, version) = decode_snapshot(value);
        assert!(shipments.is_empty());
        assert_eq!(version, 7);

        let (_, version) = decode_snapshot(json!([]));
        assert_eq!(version, 0);
    }
}
