use serde::Serialize;

use crate::models::{NodeRecord, Scheme};
use crate::settings::NormalizeSettings;
use crate::utils::base64::base64_encode;
use crate::utils::url::url_encode;

/// vmess share-link JSON, fields in the order clients expect
#[derive(Serialize)]
struct VmessLink<'a> {
    v: &'a str,
    ps: &'a str,
    add: &'a str,
    port: String,
    id: &'a str,
    aid: String,
    scy: &'a str,
    net: &'a str,
    tls: &'a str,
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(default)
}

/// Convert a node to its canonical share link
///
/// vless nodes are always written as reality links; missing reality fields
/// take the configured defaults.
///
/// # Arguments
/// * `node` - Node to convert
/// * `defaults` - Reality defaults for vless links
pub fn proxy_to_uri(node: &NodeRecord, defaults: &NormalizeSettings) -> String {
    let remark = url_encode(&node.name);

    match node.scheme {
        Scheme::Vless => {
            // Format: vless://uuid@server:port?security=reality&sni=..&fp=..&publicKey=..&shortId=..&flow=..#remark
            let reality = node.reality.as_ref();
            let public_key = or_default(
                reality.map(|r| r.public_key.as_str()),
                &defaults.default_public_key,
            );
            let short_id = reality.map(|r| r.short_id.as_str()).unwrap_or_default();

            let mut params = vec![
                "security=reality".to_string(),
                format!(
                    "sni={}",
                    url_encode(or_default(node.sni.as_deref(), &defaults.default_sni))
                ),
                format!(
                    "fp={}",
                    url_encode(or_default(
                        node.fingerprint.as_deref(),
                        &defaults.default_fingerprint
                    ))
                ),
                format!("publicKey={}", url_encode(public_key)),
            ];
            if !short_id.is_empty() {
                params.push(format!("shortId={}", url_encode(short_id)));
            }
            params.push(format!(
                "flow={}",
                url_encode(or_default(node.flow.as_deref(), &defaults.default_flow))
            ));

            format!(
                "vless://{}@{}:{}?{}#{}",
                node.identifier,
                node.server,
                node.port,
                params.join("&"),
                remark
            )
        }
        Scheme::Shadowsocks => {
            // Format: ss://auth@server:port#remark, auth kept as parsed
            format!(
                "{}{}@{}:{}#{}",
                node.scheme.prefix(),
                node.identifier,
                node.server,
                node.port,
                remark
            )
        }
        Scheme::Trojan => {
            // Format: trojan://password@server:port#remark
            format!(
                "{}{}@{}:{}#{}",
                node.scheme.prefix(),
                url_encode(&node.identifier),
                node.server,
                node.port,
                remark
            )
        }
        Scheme::VMess => {
            // Format: vmess://BASE64(JSON)
            let link = VmessLink {
                v: "2",
                ps: &node.name,
                add: &node.server,
                port: node.port.to_string(),
                id: &node.identifier,
                aid: node.alter_id.unwrap_or(0).to_string(),
                scy: or_default(node.cipher.as_deref(), "auto"),
                net: or_default(Some(node.transport.as_str()), "tcp"),
                tls: if node.tls { "tls" } else { "" },
            };

            if let Ok(json_str) = serde_json::to_string(&link) {
                format!("vmess://{}", base64_encode(&json_str))
            } else {
                String::new()
            }
        }
    }
}

/// Convert nodes to a base64 subscription: one link per line, newline-joined.
pub fn proxy_to_single(nodes: &[NodeRecord], defaults: &NormalizeSettings) -> String {
    let links: Vec<String> = nodes
        .iter()
        .map(|node| proxy_to_uri(node, defaults))
        .filter(|uri| !uri.is_empty())
        .collect();

    base64_encode(&links.join("\n"))
}
