use super::{remark_or_placeholder, split_credentials, split_host_port, split_link, ExplodeError};
use crate::models::{NodeRecord, Scheme};

/// Parse a Shadowsocks link of the form `ss://auth@host:port#name`.
///
/// The auth token is kept as-is; the cipher is not recovered from it.
pub fn explode_ss(ss: &str) -> Result<NodeRecord, ExplodeError> {
    let parts = split_link(ss, Scheme::Shadowsocks)?;
    let (auth, host_port) = split_credentials(parts.authority)?;
    let (server, port) = split_host_port(host_port)?;

    let name = remark_or_placeholder(parts.fragment, Scheme::Shadowsocks, &server, port);
    let mut node = NodeRecord::new(Scheme::Shadowsocks, server, port, auth, name);
    node.cipher = Some("unknown".to_string());
    Ok(node)
}
