use lazy_static::lazy_static;
use log::info;
use regex::Regex;

use super::{resolve_url, SourceError, SourceOutput};
use crate::parser::explodes::explode_links;
use crate::settings::Settings;
use crate::utils::http::Fetcher;

lazy_static! {
    static ref ARTICLE_LINK_REGEX: Regex =
        Regex::new(r#"href="([^"]*clashnode[^"]*html[^"]*)""#).unwrap();
}

/// The first `clashnode` article link; the home page lists newest first.
pub fn extract_article_link(page: &str) -> Option<&str> {
    ARTICLE_LINK_REGEX
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub async fn collect(
    base_url: &str,
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    info!("Fetching clashgithub home page {}", base_url);
    let home = fetcher.get(base_url).await?;
    let link = extract_article_link(&home).ok_or(SourceError::PatternNotFound {
        what: "clashnode article link",
        url: base_url.to_string(),
    })?;

    let article_url = resolve_url(base_url, link)?;
    info!("Fetching clashgithub article {}", article_url);
    let article = fetcher.get(&article_url).await?;

    // Share links are embedded directly in the article body
    let (nodes, stats) = explode_links(&article, settings);
    Ok(SourceOutput::new(nodes, stats))
}
