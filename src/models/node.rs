//! Node model definitions
//!
//! Contains the canonical record for one proxy endpoint and its JSON shape.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Represents the scheme of a proxy share link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Vless,
    Shadowsocks,
    Trojan,
    VMess,
}

impl Scheme {
    pub const ALL: [Scheme; 4] = [
        Scheme::Vless,
        Scheme::Shadowsocks,
        Scheme::Trojan,
        Scheme::VMess,
    ];

    /// Lowercase identifier, used as the `type` key in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Vless => "vless",
            Scheme::Shadowsocks => "ss",
            Scheme::Trojan => "trojan",
            Scheme::VMess => "vmess",
        }
    }

    /// Human-readable name, used for placeholder remarks.
    pub fn display_name(self) -> &'static str {
        match self {
            Scheme::Vless => "VLESS",
            Scheme::Shadowsocks => "SS",
            Scheme::Trojan => "Trojan",
            Scheme::VMess => "VMess",
        }
    }

    /// Share-link prefix including `://`.
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Vless => "vless://",
            Scheme::Shadowsocks => "ss://",
            Scheme::Trojan => "trojan://",
            Scheme::VMess => "vmess://",
        }
    }

    /// Detects the scheme from the start of a link.
    pub fn from_link(link: &str) -> Option<Scheme> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| link.starts_with(scheme.prefix()))
    }

    /// Whether the identifier holds a UUID rather than a password.
    pub fn uses_uuid(self) -> bool {
        matches!(self, Scheme::Vless | Scheme::VMess)
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reality options carried by vless nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealityOpts {
    pub public_key: String,
    pub short_id: String,
}

/// Represents one proxy node after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub scheme: Scheme,
    pub server: String,
    pub port: u16,
    /// UUID for vless/vmess, password for ss/trojan
    pub identifier: String,
    pub name: String,
    pub transport: String,
    pub tls: bool,
    pub udp: Option<bool>,

    pub flow: Option<String>,
    pub sni: Option<String>,
    pub reality: Option<RealityOpts>,
    pub fingerprint: Option<String>,
    pub cipher: Option<String>,
    pub alter_id: Option<u32>,
}

impl NodeRecord {
    /// Creates a record with the base fields set and every optional field empty.
    pub fn new(
        scheme: Scheme,
        server: impl Into<String>,
        port: u16,
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        NodeRecord {
            scheme,
            server: server.into(),
            port,
            identifier: identifier.into(),
            name: name.into(),
            transport: String::from("tcp"),
            tls: false,
            udp: None,
            flow: None,
            sni: None,
            reality: None,
            fingerprint: None,
            cipher: None,
            alter_id: None,
        }
    }

    /// Placeholder remark for nodes whose source supplies none.
    pub fn placeholder_name(scheme: Scheme, server: &str, port: u16) -> String {
        match scheme {
            Scheme::VMess => String::from("VMess Node"),
            _ => format!("{}-{}:{}", scheme.display_name(), server, port),
        }
    }

    /// Uniqueness key used by the dedup pass.
    pub fn key(&self) -> (Scheme, &str, u16) {
        (self.scheme, self.server.as_str(), self.port)
    }

    pub fn is_reality(&self) -> bool {
        self.reality.is_some()
    }
}

struct RealityOptsJson<'a>(&'a RealityOpts);

impl Serialize for RealityOptsJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("public-key", &self.0.public_key)?;
        map.serialize_entry("short-id", &self.0.short_id)?;
        map.end()
    }
}

/// Serializes with Clash-style keys, skipping fields that were never populated.
impl Serialize for NodeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.scheme.as_str())?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("server", &self.server)?;
        map.serialize_entry("port", &self.port)?;
        if self.scheme.uses_uuid() {
            map.serialize_entry("uuid", &self.identifier)?;
        } else {
            map.serialize_entry("password", &self.identifier)?;
        }
        if let Some(alter_id) = self.alter_id {
            map.serialize_entry("alterId", &alter_id)?;
        }
        if let Some(cipher) = &self.cipher {
            map.serialize_entry("cipher", cipher)?;
        }
        // ss and trojan records carry no transport in their JSON form
        if matches!(self.scheme, Scheme::Vless | Scheme::VMess) {
            map.serialize_entry("network", &self.transport)?;
            map.serialize_entry("tls", &self.tls)?;
        }
        if let Some(udp) = self.udp {
            map.serialize_entry("udp", &udp)?;
        }
        if let Some(flow) = &self.flow {
            map.serialize_entry("flow", flow)?;
        }
        if let Some(sni) = &self.sni {
            map.serialize_entry("servername", sni)?;
        }
        if let Some(reality) = &self.reality {
            map.serialize_entry("reality-opts", &RealityOptsJson(reality))?;
        }
        if let Some(fingerprint) = &self.fingerprint {
            map.serialize_entry("client-fingerprint", fingerprint)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scheme_from_link() {
        assert_eq!(Scheme::from_link("vless://a@b:1"), Some(Scheme::Vless));
        assert_eq!(Scheme::from_link("ss://a@b:1"), Some(Scheme::Shadowsocks));
        assert_eq!(Scheme::from_link("trojan://a@b:1"), Some(Scheme::Trojan));
        assert_eq!(Scheme::from_link("vmess://abc"), Some(Scheme::VMess));
        assert_eq!(Scheme::from_link("ssr://abc"), None);
        assert_eq!(Scheme::from_link("hysteria2://abc"), None);
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(
            NodeRecord::placeholder_name(Scheme::Shadowsocks, "1.2.3.4", 8388),
            "SS-1.2.3.4:8388"
        );
        assert_eq!(
            NodeRecord::placeholder_name(Scheme::Trojan, "example.com", 443),
            "Trojan-example.com:443"
        );
        assert_eq!(
            NodeRecord::placeholder_name(Scheme::VMess, "example.com", 443),
            "VMess Node"
        );
    }

    #[test]
    fn test_serialize_trojan_skips_unpopulated_fields() {
        let node = NodeRecord::new(Scheme::Trojan, "1.2.3.4", 443, "pw", "MyNode");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "trojan",
                "name": "MyNode",
                "server": "1.2.3.4",
                "port": 443,
                "password": "pw"
            })
        );
    }

    #[test]
    fn test_serialize_vless_reality() {
        let mut node = NodeRecord::new(Scheme::Vless, "example.com", 443, "uuid-1", "🇭🇰 香港");
        node.tls = true;
        node.udp = Some(true);
        node.flow = Some("xtls-rprx-vision".to_string());
        node.sni = Some("www.microsoft.com".to_string());
        node.reality = Some(RealityOpts {
            public_key: "key".to_string(),
            short_id: String::new(),
        });
        node.fingerprint = Some("chrome".to_string());

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "vless");
        assert_eq!(value["uuid"], "uuid-1");
        assert_eq!(value["network"], "tcp");
        assert_eq!(value["tls"], true);
        assert_eq!(value["servername"], "www.microsoft.com");
        assert_eq!(value["reality-opts"]["public-key"], "key");
        assert_eq!(value["reality-opts"]["short-id"], "");
        assert_eq!(value["client-fingerprint"], "chrome");
        assert!(value.get("password").is_none());

        let text = serde_json::to_string(&node).unwrap();
        assert!(text.contains("🇭🇰 香港"));
    }
}
