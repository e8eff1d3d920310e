use serde_json::Value;

use super::ExplodeError;
use crate::models::{NodeRecord, Scheme};
use crate::utils::base64::base64_decode;

const DEFAULT_PORT: u16 = 443;

/// First non-empty string among `keys`.
fn json_str<'a>(json: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| json.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
}

/// Integer held either as a JSON number or as a numeric string.
fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Port from the `port` field: missing or non-numeric falls back to 443,
/// numeric values outside 1-65535 are rejected.
fn vmess_port(json: &Value) -> Result<u16, ExplodeError> {
    let Some(raw) = json.get("port") else {
        return Ok(DEFAULT_PORT);
    };
    match json_int(raw) {
        None => Ok(DEFAULT_PORT),
        Some(port) => u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ExplodeError::InvalidPort(port.to_string())),
    }
}

/// Parse a VMess link (`vmess://` followed by base64-encoded JSON)
pub fn explode_vmess(vmess: &str) -> Result<NodeRecord, ExplodeError> {
    let payload = vmess
        .strip_prefix(Scheme::VMess.prefix())
        .ok_or(ExplodeError::UnsupportedScheme)?;
    let payload = payload.split('#').next().unwrap_or_default().trim();
    if payload.is_empty() {
        return Err(ExplodeError::EmptyPayload);
    }

    let decoded = base64_decode(payload).ok_or(ExplodeError::InvalidBase64)?;
    let json: Value =
        serde_json::from_str(&decoded).map_err(|e| ExplodeError::InvalidJson(e.to_string()))?;
    if !json.is_object() {
        return Err(ExplodeError::InvalidJson("not an object".to_string()));
    }

    let server = json_str(&json, &["add", "host"]).ok_or(ExplodeError::MissingServer)?;
    let uuid = json_str(&json, &["id"]).ok_or(ExplodeError::MissingIdentifier)?;
    let port = vmess_port(&json)?;
    let name = json_str(&json, &["ps", "remarks"])
        .map(str::to_string)
        .unwrap_or_else(|| NodeRecord::placeholder_name(Scheme::VMess, server, port));

    let alter_id = ["aid", "alterId"]
        .iter()
        .find_map(|key| json.get(*key).and_then(json_int))
        .and_then(|aid| u32::try_from(aid).ok())
        .unwrap_or(0);

    let mut node = NodeRecord::new(Scheme::VMess, server, port, uuid, name);
    node.alter_id = Some(alter_id);
    node.cipher = Some(json_str(&json, &["scy"]).unwrap_or("auto").to_string());
    if let Some(net) = json_str(&json, &["net"]) {
        node.transport = net.to_string();
    }
    node.tls = json.get("tls").and_then(Value::as_str) == Some("tls");

    Ok(node)
}
