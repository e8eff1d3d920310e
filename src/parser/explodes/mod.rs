//! Share-link parsers ("explodes"), one module per scheme.
//!
//! Every per-scheme function returns `Result<NodeRecord, ExplodeError>`;
//! [`common::explode`] is the batch-facing entry point that turns a failure
//! into `None`.

pub mod common;
pub mod ss;
pub mod trojan;
pub mod vless;
pub mod vmess;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{NodeRecord, Scheme};
use crate::utils::url::url_decode;

pub use common::{
    decode_subscription, explode, explode_link, explode_links, extract_links, ExplodeStats,
};

/// Reasons a single share link yields no node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExplodeError {
    #[error("unsupported scheme")]
    UnsupportedScheme,

    #[error("missing '@' between credentials and host")]
    MissingCredentials,

    #[error("missing port")]
    MissingPort,

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("missing uuid")]
    MissingIdentifier,

    #[error("missing server address")]
    MissingServer,

    #[error("empty payload")]
    EmptyPayload,

    #[error("payload is not valid base64")]
    InvalidBase64,

    #[error("payload is not a JSON object: {0}")]
    InvalidJson(String),

    #[error("name matches region blacklist marker {0:?}")]
    Blacklisted(String),
}

impl ExplodeError {
    /// Content-policy drops are counted apart from parse failures.
    pub fn is_filtered(&self) -> bool {
        matches!(self, ExplodeError::Blacklisted(_))
    }
}

/// The pieces of `scheme://authority[/path][?query][#fragment]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LinkParts<'a> {
    pub authority: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

/// Splits a link after its scheme prefix. The authority ends at the first
/// `/`, `?` or `#`.
pub(crate) fn split_link(link: &str, scheme: Scheme) -> Result<LinkParts<'_>, ExplodeError> {
    let rest = link
        .strip_prefix(scheme.prefix())
        .ok_or(ExplodeError::UnsupportedScheme)?;

    let (rest, fragment) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (rest, None),
    };
    let (rest, query) = match rest.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (rest, None),
    };
    let authority = rest.split('/').next().unwrap_or_default();

    Ok(LinkParts {
        authority,
        query,
        fragment,
    })
}

/// Splits `credentials@host:port` on the last `@`.
pub(crate) fn split_credentials(authority: &str) -> Result<(&str, &str), ExplodeError> {
    authority
        .rsplit_once('@')
        .ok_or(ExplodeError::MissingCredentials)
}

/// Parses a port number in 1-65535.
pub(crate) fn parse_port(port: &str) -> Result<u16, ExplodeError> {
    match port.trim().parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ExplodeError::InvalidPort(port.to_string())),
    }
}

/// Splits `host:port` on the last `:` so bracketed IPv6 hosts keep their colons.
pub(crate) fn split_host_port(host_port: &str) -> Result<(String, u16), ExplodeError> {
    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or(ExplodeError::MissingPort)?;
    if host.is_empty() {
        return Err(ExplodeError::MissingServer);
    }
    Ok((host.to_string(), parse_port(port)?))
}

/// Query parameters with empty values dropped; the first occurrence of a key wins.
pub(crate) fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    params
}

/// Value of the first present key in `keys`.
pub(crate) fn first_param<'a>(params: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| params.get(*key))
        .map(String::as_str)
}

/// Percent-decoded fragment, or the placeholder name when it is empty.
pub(crate) fn remark_or_placeholder(
    fragment: Option<&str>,
    scheme: Scheme,
    server: &str,
    port: u16,
) -> String {
    match fragment.map(url_decode) {
        Some(name) if !name.is_empty() => name,
        _ => NodeRecord::placeholder_name(scheme, server, port),
    }
}
