use std::borrow::Cow;
use std::ops::AddAssign;

use super::ss::explode_ss;
use super::trojan::explode_trojan;
use super::vless::explode_vless;
use super::vmess::explode_vmess;
use super::ExplodeError;
use crate::models::{NodeRecord, Scheme};
use crate::parser::filter::check_node;
use crate::settings::Settings;
use crate::utils::base64::base64_decode;

/// Counters for one batch of share links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplodeStats {
    pub candidates: usize,
    pub parsed: usize,
    pub failed: usize,
    pub filtered: usize,
}

impl AddAssign for ExplodeStats {
    fn add_assign(&mut self, other: Self) {
        self.candidates += other.candidates;
        self.parsed += other.parsed;
        self.failed += other.failed;
        self.filtered += other.filtered;
    }
}

/// Parses one share link and applies the name filter.
pub fn explode_link(link: &str, settings: &Settings) -> Result<NodeRecord, ExplodeError> {
    let link = link.trim();
    let node = match Scheme::from_link(link) {
        Some(Scheme::Vless) => explode_vless(link, &settings.normalize),
        Some(Scheme::Shadowsocks) => explode_ss(link),
        Some(Scheme::Trojan) => explode_trojan(link),
        Some(Scheme::VMess) => explode_vmess(link),
        None => Err(ExplodeError::UnsupportedScheme),
    }?;
    check_node(node, &settings.filter)
}

/// Explode a share link into a NodeRecord, or `None` if it is unusable
pub fn explode(link: &str, settings: &Settings) -> Option<NodeRecord> {
    match explode_link(link, settings) {
        Ok(node) => Some(node),
        Err(e) => {
            log::debug!("Skipping {}: {}", abbreviate(link), e);
            None
        }
    }
}

fn abbreviate(link: &str) -> Cow<'_, str> {
    const MAX_CHARS: usize = 60;
    match link.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &link[..idx])),
        None => Cow::Borrowed(link),
    }
}

/// Decodes a whole-body base64 subscription, leaving any other text as is.
pub fn decode_subscription(text: &str) -> Cow<'_, str> {
    if text.contains("://") {
        return Cow::Borrowed(text);
    }
    let compact: String = text.split_whitespace().collect();
    if compact.is_empty() {
        return Cow::Borrowed(text);
    }
    match base64_decode(&compact) {
        Some(decoded) if decoded.contains("://") => Cow::Owned(decoded),
        _ => Cow::Borrowed(text),
    }
}

/// Collects candidate links: the first token of every line that starts with a known prefix.
/// A token ends at whitespace or at the first `<` of trailing markup.
pub fn extract_links(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| Scheme::from_link(line).is_some())
        .filter_map(|line| line.split_whitespace().next())
        .map(|token| token.find('<').map_or(token, |end| &token[..end]))
        .collect()
}

/// Explodes every candidate link in `text`, which may also be a base64 subscription.
pub fn explode_links(text: &str, settings: &Settings) -> (Vec<NodeRecord>, ExplodeStats) {
    let text = decode_subscription(text);
    let links = extract_links(&text);

    let mut stats = ExplodeStats {
        candidates: links.len(),
        ..ExplodeStats::default()
    };
    let mut nodes = Vec::with_capacity(links.len());

    for link in links {
        match explode_link(link, settings) {
            Ok(node) => {
                stats.parsed += 1;
                nodes.push(node);
            }
            Err(e) if e.is_filtered() => {
                log::debug!("Filtered {}: {}", abbreviate(link), e);
                stats.filtered += 1;
            }
            Err(e) => {
                log::debug!("Skipping {}: {}", abbreviate(link), e);
                stats.failed += 1;
            }
        }
    }

    (nodes, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::base64::base64_encode;

    #[test]
    fn test_explode_dispatch() {
        let settings = Settings::default();
        assert_eq!(
            explode("trojan://pw@1.2.3.4:443#MyNode", &settings).map(|n| n.scheme),
            Some(Scheme::Trojan)
        );
        assert_eq!(
            explode("  ss://auth@1.2.3.4:8388#n  ", &settings).map(|n| n.scheme),
            Some(Scheme::Shadowsocks)
        );
        assert!(explode("hysteria2://pw@1.2.3.4:443", &settings).is_none());
        assert!(explode("", &settings).is_none());
    }

    #[test]
    fn test_china_dropped_for_every_scheme() {
        let settings = Settings::default();
        let vmess = format!(
            "vmess://{}",
            base64_encode(r#"{"add":"1.2.3.4","id":"u","port":443,"ps":"China VMess"}"#)
        );
        let links = [
            "vless://id@1.2.3.4:443?security=reality#China%20VLESS".to_string(),
            "ss://auth@1.2.3.4:8388#China%20SS".to_string(),
            "trojan://pw@1.2.3.4:443#China%20Trojan".to_string(),
            vmess,
        ];
        for link in &links {
            assert!(matches!(
                explode_link(link, &settings),
                Err(ExplodeError::Blacklisted(_))
            ));
            assert!(explode(link, &settings).is_none());
        }
    }

    #[test]
    fn test_extract_links() {
        let text = "\
<p>Today's nodes</p>
vless://id@a.com:443#A<br/>
  trojan://pw@b.com:443#B  extra words
http://not-a-node.example.com
ssr://legacy
<div>ss://auth@c.com:8388</div>
";
        assert_eq!(
            extract_links(text),
            vec!["vless://id@a.com:443#A", "trojan://pw@b.com:443#B"]
        );
    }

    #[test]
    fn test_decode_subscription() {
        let plain = "trojan://pw@b.com:443#B\nss://auth@c.com:8388#C";
        let encoded = base64_encode(plain);
        assert_eq!(decode_subscription(&encoded), plain);
        assert_eq!(decode_subscription(plain), plain);
        assert_eq!(decode_subscription("aGVsbG8="), "aGVsbG8=");
    }

    #[test]
    fn test_explode_links_stats() {
        let text = "\
trojan://pw@1.2.3.4:443#One
trojan://pw@1.2.3.4:notaport#Bad
ss://auth@5.6.7.8:8388#China%20SS
vmess://aGVsbG8gd29ybGQ=
just some text";
        let (nodes, stats) = explode_links(text, &Settings::default());

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "One");
        assert_eq!(
            stats,
            ExplodeStats {
                candidates: 4,
                parsed: 1,
                failed: 2,
                filtered: 1,
            }
        );
    }
}
