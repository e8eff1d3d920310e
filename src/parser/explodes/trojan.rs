use super::{
    first_param, query_params, remark_or_placeholder, split_credentials, split_host_port,
    split_link, ExplodeError,
};
use crate::models::{NodeRecord, Scheme};
use crate::utils::url::url_decode;

/// Parse a Trojan link into a NodeRecord
pub fn explode_trojan(trojan: &str) -> Result<NodeRecord, ExplodeError> {
    let parts = split_link(trojan, Scheme::Trojan)?;
    let (password, host_port) = split_credentials(parts.authority)?;
    let (server, port) = split_host_port(host_port)?;
    let params = query_params(parts.query);

    let name = remark_or_placeholder(parts.fragment, Scheme::Trojan, &server, port);
    let mut node = NodeRecord::new(Scheme::Trojan, server, port, url_decode(password), name);
    node.tls = true;
    // "peer" is the older spelling of "sni"
    node.sni = first_param(&params, &["sni", "peer"]).map(str::to_string);
    Ok(node)
}
