use std::collections::HashMap;

use super::{
    first_param, query_params, remark_or_placeholder, split_credentials, split_host_port,
    split_link, ExplodeError,
};
use crate::models::{NodeRecord, RealityOpts, Scheme};
use crate::settings::NormalizeSettings;

fn param_or(params: &HashMap<String, String>, keys: &[&str], default: &str) -> String {
    first_param(params, keys).unwrap_or(default).to_string()
}

/// Parse a VLESS link into a NodeRecord
///
/// Reality options are filled only for `security=reality`, falling back to
/// the configured defaults for any parameter the link omits.
pub fn explode_vless(vless: &str, defaults: &NormalizeSettings) -> Result<NodeRecord, ExplodeError> {
    let parts = split_link(vless, Scheme::Vless)?;
    let (uuid, host_port) = split_credentials(parts.authority)?;
    if uuid.is_empty() {
        return Err(ExplodeError::MissingIdentifier);
    }
    let (server, port) = split_host_port(host_port)?;
    let params = query_params(parts.query);

    let name = remark_or_placeholder(parts.fragment, Scheme::Vless, &server, port);
    let mut node = NodeRecord::new(Scheme::Vless, server, port, uuid, name);
    node.tls = true;
    node.udp = Some(true);
    if let Some(transport) = first_param(&params, &["type"]) {
        node.transport = transport.to_string();
    }

    if first_param(&params, &["security"]) != Some("reality") {
        return Ok(node);
    }

    node.flow = Some(param_or(&params, &["flow"], &defaults.default_flow));
    node.sni = Some(param_or(&params, &["sni", "servername"], &defaults.default_sni));
    node.reality = Some(RealityOpts {
        public_key: param_or(&params, &["pbk", "publicKey"], &defaults.default_public_key),
        short_id: param_or(&params, &["sid", "shortId"], ""),
    });
    node.fingerprint = Some(param_or(&params, &["fp"], &defaults.default_fingerprint));

    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explode_vless_reality() {
        let link = "vless://b831381d-6324-4d53-ad4f-8cda48b30811@example.com:443?security=reality&sni=www.apple.com&pbk=abcKey&sid=6ba85179&fp=firefox&flow=xtls-rprx-vision#%F0%9F%87%AD%F0%9F%87%B0%20HK";
        let node = explode_vless(link, &NormalizeSettings::default()).unwrap();

        assert_eq!(node.scheme, Scheme::Vless);
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 443);
        assert_eq!(node.identifier, "b831381d-6324-4d53-ad4f-8cda48b30811");
        assert_eq!(node.name, "🇭🇰 HK");
        assert!(node.tls);
        assert_eq!(node.udp, Some(true));
        assert_eq!(node.transport, "tcp");
        assert_eq!(node.sni.as_deref(), Some("www.apple.com"));
        assert_eq!(node.fingerprint.as_deref(), Some("firefox"));
        assert_eq!(node.flow.as_deref(), Some("xtls-rprx-vision"));
        let reality = node.reality.unwrap();
        assert_eq!(reality.public_key, "abcKey");
        assert_eq!(reality.short_id, "6ba85179");
    }

    #[test]
    fn test_explode_vless_reality_defaults() {
        let defaults = NormalizeSettings::default();
        let node = explode_vless(
            "vless://id@1.2.3.4:8443?security=reality&sni=&publicKey=altKey#n",
            &defaults,
        )
        .unwrap();

        assert_eq!(node.sni.as_deref(), Some("www.microsoft.com"));
        assert_eq!(node.fingerprint.as_deref(), Some("chrome"));
        assert_eq!(node.flow.as_deref(), Some("xtls-rprx-vision"));
        let reality = node.reality.unwrap();
        assert_eq!(reality.public_key, "altKey");
        assert_eq!(reality.short_id, "");
    }

    #[test]
    fn test_explode_vless_without_reality() {
        let node = explode_vless(
            "vless://id@example.com:443?security=tls&type=ws&sni=a.com",
            &NormalizeSettings::default(),
        )
        .unwrap();

        assert_eq!(node.name, "VLESS-example.com:443");
        assert_eq!(node.transport, "ws");
        assert!(node.sni.is_none());
        assert!(node.reality.is_none());
        assert!(node.flow.is_none());
    }

    #[test]
    fn test_explode_vless_invalid() {
        let defaults = NormalizeSettings::default();
        assert_eq!(
            explode_vless("vless://example.com:443", &defaults),
            Err(ExplodeError::MissingCredentials)
        );
        assert_eq!(
            explode_vless("vless://@example.com:443", &defaults),
            Err(ExplodeError::MissingIdentifier)
        );
        assert_eq!(
            explode_vless("vless://id@example.com", &defaults),
            Err(ExplodeError::MissingPort)
        );
        assert!(matches!(
            explode_vless("vless://id@example.com:99999", &defaults),
            Err(ExplodeError::InvalidPort(_))
        ));
    }
}
