use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;

use super::{resolve_url, SourceError, SourceOutput};
use crate::parser::explodes::explode_links;
use crate::settings::Settings;
use crate::utils::http::Fetcher;

lazy_static! {
    static ref ARTICLE_REGEX: Regex = Regex::new(
        r#"(?s)<div class="col-md-9 ps-3 item-body">.*?<div class="item-heading pb-2"><a href="([^"]*\d{4}-\d{1,2}-\d{1,2}[^"]*\.htm)""#
    )
    .unwrap();
    static ref TXT_LINK_REGEX: Regex =
        Regex::new(r"https://node\.freeclashnode\.com/uploads/\d{4}/\d{2}/\d+[-]\d{8}\.txt").unwrap();
}

/// Link of the newest dated article on the home page.
pub fn extract_article_path(page: &str) -> Option<&str> {
    ARTICLE_REGEX
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Every uploaded subscription file linked from an article, in page order without repeats.
pub fn extract_txt_links(page: &str) -> Vec<&str> {
    let mut links: Vec<&str> = Vec::new();
    for m in TXT_LINK_REGEX.find_iter(page) {
        if !links.contains(&m.as_str()) {
            links.push(m.as_str());
        }
    }
    links
}

pub async fn collect(
    base_url: &str,
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    info!("Fetching freeclashnode home page {}", base_url);
    let home = fetcher.get(base_url).await?;
    let path = extract_article_path(&home).ok_or(SourceError::PatternNotFound {
        what: "dated article link",
        url: base_url.to_string(),
    })?;

    let article_url = resolve_url(base_url, path)?;
    info!("Fetching freeclashnode article {}", article_url);
    let article = fetcher.get(&article_url).await?;

    let links = extract_txt_links(&article);
    if links.is_empty() {
        return Err(SourceError::PatternNotFound {
            what: "subscription file link",
            url: article_url,
        });
    }

    let mut output = SourceOutput::default();
    for link in links {
        // A broken upload should not cost the other files
        match fetcher.get(link).await {
            Ok(text) => {
                let (nodes, stats) = explode_links(&text, settings);
                info!(
                    "{}: {} nodes ({} failed, {} filtered)",
                    link, stats.parsed, stats.failed, stats.filtered
                );
                output.extend(SourceOutput::new(nodes, stats));
            }
            Err(e) => warn!("Skipping {}: {}", link, e),
        }
    }
    Ok(output)
}
