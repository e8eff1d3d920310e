//! Scraping strategies for the supported aggregator sites
//!
//! Each strategy turns one [`SourceConfig`] entry into a list of nodes. The
//! page parsing steps are plain functions over the fetched HTML so they can be
//! tested without network access.

pub mod clashgithub;
pub mod freeclashnode;
pub mod nodesdz;
pub mod subscription;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::NodeRecord;
use crate::parser::clash::{looks_like_clash, parse_clash_yaml, ClashError};
use crate::parser::explodes::{explode_links, ExplodeStats};
use crate::settings::{Settings, SourceConfig};
use crate::utils::http::{FetchError, Fetcher};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{what} not found on {url}")]
    PatternNotFound { what: &'static str, url: String },

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid base date {0:?}, expected YYYY-MM-DD")]
    InvalidBaseDate(String),

    #[error("Base date {0} is in the future")]
    FutureBaseDate(NaiveDate),

    #[error(transparent)]
    Clash(#[from] ClashError),
}

/// Nodes collected from one source, with the batch counters behind them
#[derive(Debug, Clone, Default)]
pub struct SourceOutput {
    pub nodes: Vec<NodeRecord>,
    pub stats: ExplodeStats,
}

impl SourceOutput {
    pub fn new(nodes: Vec<NodeRecord>, stats: ExplodeStats) -> Self {
        SourceOutput { nodes, stats }
    }

    pub fn extend(&mut self, other: SourceOutput) {
        self.nodes.extend(other.nodes);
        self.stats += other.stats;
    }
}

/// Parses fetched content: Clash YAML when it has a `proxies:` key, a link list
/// or base64 subscription otherwise.
pub fn parse_content(content: &str, settings: &Settings) -> Result<SourceOutput, SourceError> {
    if looks_like_clash(content) {
        let (nodes, stats) = parse_clash_yaml(content, settings)?;
        return Ok(SourceOutput::new(nodes, stats));
    }
    let (nodes, stats) = explode_links(content, settings);
    Ok(SourceOutput::new(nodes, stats))
}

/// Resolves a link found on a page against the page's base URL.
pub(crate) fn resolve_url(base: &str, href: &str) -> Result<String, SourceError> {
    let base = url::Url::parse(base).map_err(|source| SourceError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|source| SourceError::InvalidUrl {
            url: href.to_string(),
            source,
        })
}

/// Runs the scraping strategy configured for `source`.
pub async fn collect(
    source: &SourceConfig,
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    match source {
        SourceConfig::NodesdzDaily {
            base_url,
            base_id,
            base_date,
            ..
        } => nodesdz::collect_daily(base_url, *base_id, base_date, fetcher, settings).await,
        SourceConfig::NodesdzLatest {
            base_url,
            templates,
            ..
        } => nodesdz::collect_latest(base_url, templates, fetcher, settings).await,
        SourceConfig::FreeClashNode { base_url, .. } => {
            freeclashnode::collect(base_url, fetcher, settings).await
        }
        SourceConfig::ClashGithub { base_url, .. } => {
            clashgithub::collect(base_url, fetcher, settings).await
        }
        SourceConfig::Subscription { url, .. } => {
            subscription::collect(url, fetcher, settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url(
                "https://www.freeclashnode.com",
                "/free-node/2024-3-6-free-node.htm"
            )
            .unwrap(),
            "https://www.freeclashnode.com/free-node/2024-3-6-free-node.htm"
        );
        assert_eq!(
            resolve_url(
                "https://clashgithub.com",
                "https://clashgithub.com/clashnode-20240306.html"
            )
            .unwrap(),
            "https://clashgithub.com/clashnode-20240306.html"
        );
        assert!(matches!(
            resolve_url("not a url", "/x"),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_content_dispatch() {
        let settings = Settings::default();

        let yaml = "proxies:\n  - {name: A, type: trojan, server: a.com, port: 443, password: pw}\n";
        let output = parse_content(yaml, &settings).unwrap();
        assert_eq!(output.nodes.len(), 1);
        assert_eq!(output.nodes[0].name, "A");

        let links = "trojan://pw@b.com:443#B\nss://auth@c.com:8388#C\n";
        let output = parse_content(links, &settings).unwrap();
        assert_eq!(output.nodes.len(), 2);
        assert_eq!(output.stats.candidates, 2);
    }
}
