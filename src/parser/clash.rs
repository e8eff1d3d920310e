//! Clash YAML subscription reader
//!
//! Each entry of `proxies` is converted on its own, so entries of other
//! proxy types or with malformed fields are skipped without failing the
//! document.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::models::{NodeRecord, RealityOpts, Scheme};
use crate::parser::explodes::{ExplodeError, ExplodeStats};
use crate::parser::filter::check_node;
use crate::settings::Settings;

#[derive(Error, Debug)]
pub enum ClashError {
    #[error("Invalid Clash YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No 'proxies' found in Clash YAML")]
    NoProxies,
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = Option<u64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a non-negative integer or numeric string")
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        u64::try_from(value)
            .map(Some)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }
}

/// Port given as a number or a numeric string, in 1-65535
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let port = deserializer
        .deserialize_any(NumberVisitor)?
        .ok_or_else(|| <D::Error as de::Error>::missing_field("port"))?;
    u16::try_from(port)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| de::Error::custom(format!("port out of range: {}", port)))
}

fn deserialize_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_any(NumberVisitor)? {
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("value out of range: {}", value))),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashRealityOpts {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub short_id: Option<String>,
}

/// One supported entry of a Clash `proxies` list
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClashProxy {
    #[serde(rename = "vless")]
    Vless {
        #[serde(default)]
        name: Option<String>,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        uuid: String,
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        tls: Option<bool>,
        #[serde(default)]
        udp: Option<bool>,
        #[serde(default)]
        flow: Option<String>,
        #[serde(default)]
        servername: Option<String>,
        #[serde(rename = "reality-opts", default)]
        reality_opts: Option<ClashRealityOpts>,
        #[serde(rename = "client-fingerprint", default)]
        client_fingerprint: Option<String>,
    },

    #[serde(rename = "vmess")]
    VMess {
        #[serde(default)]
        name: Option<String>,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        uuid: String,
        #[serde(rename = "alterId", default, deserialize_with = "deserialize_opt_u32")]
        alter_id: Option<u32>,
        #[serde(default)]
        cipher: Option<String>,
        #[serde(default)]
        network: Option<String>,
        #[serde(default)]
        tls: Option<bool>,
        #[serde(default)]
        servername: Option<String>,
    },

    #[serde(rename = "ss")]
    Shadowsocks {
        #[serde(default)]
        name: Option<String>,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        #[serde(default)]
        cipher: Option<String>,
        password: String,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(rename = "trojan")]
    Trojan {
        #[serde(default)]
        name: Option<String>,
        server: String,
        #[serde(deserialize_with = "deserialize_port")]
        port: u16,
        password: String,
        #[serde(default)]
        sni: Option<String>,
        #[serde(default)]
        udp: Option<bool>,
    },

    #[serde(other)]
    Unknown,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn record_name(name: Option<String>, scheme: Scheme, server: &str, port: u16) -> String {
    non_empty(name).unwrap_or_else(|| NodeRecord::placeholder_name(scheme, server, port))
}

impl ClashProxy {
    /// Converts the entry into a NodeRecord. Unsupported types and entries
    /// without a server or identifier yield `None`.
    pub fn into_node(self) -> Option<NodeRecord> {
        let node = match self {
            ClashProxy::Vless {
                name,
                server,
                port,
                uuid,
                network,
                tls,
                udp,
                flow,
                servername,
                reality_opts,
                client_fingerprint,
            } => {
                if uuid.is_empty() {
                    return None;
                }
                let name = record_name(name, Scheme::Vless, &server, port);
                let mut node = NodeRecord::new(Scheme::Vless, server, port, uuid, name);
                node.tls = tls.unwrap_or(true);
                node.udp = udp;
                if let Some(network) = non_empty(network) {
                    node.transport = network;
                }
                node.flow = non_empty(flow);
                node.sni = non_empty(servername);
                node.reality = reality_opts.map(|opts| RealityOpts {
                    public_key: opts.public_key.unwrap_or_default(),
                    short_id: opts.short_id.unwrap_or_default(),
                });
                node.fingerprint = non_empty(client_fingerprint);
                node
            }
            ClashProxy::VMess {
                name,
                server,
                port,
                uuid,
                alter_id,
                cipher,
                network,
                tls,
                servername,
            } => {
                if uuid.is_empty() {
                    return None;
                }
                let name = record_name(name, Scheme::VMess, &server, port);
                let mut node = NodeRecord::new(Scheme::VMess, server, port, uuid, name);
                node.alter_id = Some(alter_id.unwrap_or(0));
                node.cipher = Some(non_empty(cipher).unwrap_or_else(|| "auto".to_string()));
                if let Some(network) = non_empty(network) {
                    node.transport = network;
                }
                node.tls = tls.unwrap_or(false);
                node.sni = non_empty(servername);
                node
            }
            ClashProxy::Shadowsocks {
                name,
                server,
                port,
                cipher,
                password,
                udp,
            } => {
                let name = record_name(name, Scheme::Shadowsocks, &server, port);
                let mut node = NodeRecord::new(Scheme::Shadowsocks, server, port, password, name);
                node.cipher = Some(non_empty(cipher).unwrap_or_else(|| "unknown".to_string()));
                node.udp = udp;
                node
            }
            ClashProxy::Trojan {
                name,
                server,
                port,
                password,
                sni,
                udp,
            } => {
                let name = record_name(name, Scheme::Trojan, &server, port);
                let mut node = NodeRecord::new(Scheme::Trojan, server, port, password, name);
                node.tls = true;
                node.sni = non_empty(sni);
                node.udp = udp;
                node
            }
            ClashProxy::Unknown => return None,
        };

        if node.server.is_empty() {
            return None;
        }
        Some(node)
    }
}

#[derive(Debug, Deserialize)]
struct ClashDocument {
    #[serde(default)]
    proxies: Vec<Value>,
}

/// Heuristic used to tell a Clash config from a link list.
pub fn looks_like_clash(content: &str) -> bool {
    content
        .lines()
        .any(|line| line.trim_start().starts_with("proxies:"))
}

/// Parses the `proxies` list of a Clash config and applies the name filter.
pub fn parse_clash_yaml(
    content: &str,
    settings: &Settings,
) -> Result<(Vec<NodeRecord>, ExplodeStats), ClashError> {
    let document: ClashDocument = serde_yaml::from_str(content)?;
    if document.proxies.is_empty() {
        return Err(ClashError::NoProxies);
    }

    let mut stats = ExplodeStats {
        candidates: document.proxies.len(),
        ..ExplodeStats::default()
    };
    let mut nodes = Vec::new();

    for entry in document.proxies {
        let node = match serde_yaml::from_value::<ClashProxy>(entry) {
            Ok(proxy) => proxy.into_node(),
            Err(e) => {
                log::debug!("Skipping malformed Clash proxy: {}", e);
                None
            }
        };
        let Some(node) = node else {
            stats.failed += 1;
            continue;
        };

        match check_node(node, &settings.filter) {
            Ok(node) => {
                stats.parsed += 1;
                nodes.push(node);
            }
            Err(ExplodeError::Blacklisted(marker)) => {
                log::debug!("Filtered Clash proxy matching {:?}", marker);
                stats.filtered += 1;
            }
            Err(e) => {
                log::debug!("Skipping Clash proxy: {}", e);
                stats.failed += 1;
            }
        }
    }

    Ok((nodes, stats))
}
