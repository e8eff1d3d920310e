use chrono::{NaiveDate, Utc};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use uuid::Uuid;

use super::{SourceError, SourceOutput};
use crate::models::{NodeRecord, RealityOpts, Scheme};
use crate::parser::clash::parse_clash_yaml;
use crate::parser::explodes::ExplodeStats;
use crate::settings::{NormalizeSettings, Settings, TemplateNode};
use crate::utils::http::Fetcher;

lazy_static! {
    static ref CLASH_URL_REGEX: Regex = Regex::new(r#"clash\s*:\s*"(https?://[^\s"]+)""#).unwrap();
    static ref LATEST_ARTICLE_REGEX: Regex =
        Regex::new(r#"(?s)<article class="log">.*?<h3>\s*<a href="https?://.*?/?\?id=(\d+)""#)
            .unwrap();
    static ref CLASH_UUID_REGEX: Regex = Regex::new(
        r#"clash:\s*".*?/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})\.yaml""#
    )
    .unwrap();
}

/// Article id for `today`: one id per day counted from the base date.
pub fn daily_article_id(base_id: u32, base_date: &str, today: NaiveDate) -> Result<u32, SourceError> {
    let base = NaiveDate::parse_from_str(base_date.trim(), "%Y-%m-%d")
        .map_err(|_| SourceError::InvalidBaseDate(base_date.to_string()))?;
    let days = (today - base).num_days();
    if days < 0 {
        return Err(SourceError::FutureBaseDate(base));
    }
    let days = u32::try_from(days).map_err(|_| SourceError::InvalidBaseDate(base_date.to_string()))?;
    Ok(base_id.saturating_add(days))
}

/// First `clash: "<url>"` download link on an article page.
pub fn extract_clash_url(page: &str) -> Option<&str> {
    CLASH_URL_REGEX
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Id of the newest article on the home page.
pub fn extract_latest_article_id(page: &str) -> Option<&str> {
    LATEST_ARTICLE_REGEX
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// UUID embedded in the Clash download link of an article page.
pub fn extract_uuid(page: &str) -> Option<Uuid> {
    CLASH_UUID_REGEX
        .captures(page)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Uuid::parse_str(m.as_str()).ok())
}

/// Builds one vless reality node per template, all sharing `uuid`.
pub fn template_nodes(
    uuid: &Uuid,
    templates: &[TemplateNode],
    defaults: &NormalizeSettings,
) -> Vec<NodeRecord> {
    templates
        .iter()
        .map(|template| {
            let mut node = NodeRecord::new(
                Scheme::Vless,
                template.server.as_str(),
                template.port,
                uuid.to_string(),
                template.name.as_str(),
            );
            node.tls = true;
            node.udp = Some(true);
            node.flow = Some(defaults.default_flow.clone());
            node.sni = Some(defaults.default_sni.clone());
            node.reality = Some(RealityOpts {
                public_key: defaults.default_public_key.clone(),
                short_id: String::new(),
            });
            node.fingerprint = Some(defaults.default_fingerprint.clone());
            node
        })
        .collect()
}

fn article_url(base_url: &str, id: impl std::fmt::Display) -> String {
    format!("{}/?id={}", base_url.trim_end_matches('/'), id)
}

pub async fn collect_daily(
    base_url: &str,
    base_id: u32,
    base_date: &str,
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    let id = daily_article_id(base_id, base_date, Utc::now().date_naive())?;
    let page_url = article_url(base_url, id);
    info!("Fetching nodesdz article {}", page_url);
    let page = fetcher.get(&page_url).await?;

    let clash_url = extract_clash_url(&page).ok_or(SourceError::PatternNotFound {
        what: "Clash subscription link",
        url: page_url.clone(),
    })?;
    info!("Downloading Clash subscription {}", clash_url);
    let yaml = fetcher.get_clash(clash_url).await?;

    let (nodes, stats) = parse_clash_yaml(&yaml, settings)?;
    Ok(SourceOutput::new(nodes, stats))
}

pub async fn collect_latest(
    base_url: &str,
    templates: &[TemplateNode],
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    info!("Fetching nodesdz home page {}", base_url);
    let home = fetcher.get(base_url).await?;
    let id = extract_latest_article_id(&home).ok_or(SourceError::PatternNotFound {
        what: "latest article id",
        url: base_url.to_string(),
    })?;

    let page_url = article_url(base_url, id);
    info!("Fetching nodesdz article {}", page_url);
    let page = fetcher.get(&page_url).await?;
    let uuid = extract_uuid(&page).ok_or(SourceError::PatternNotFound {
        what: "Clash link uuid",
        url: page_url.clone(),
    })?;
    info!("Found uuid {}", uuid);

    let nodes = template_nodes(&uuid, templates, &settings.normalize);
    let stats = ExplodeStats {
        candidates: nodes.len(),
        parsed: nodes.len(),
        ..ExplodeStats::default()
    };
    Ok(SourceOutput::new(nodes, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME_PAGE: &str = r#"
<div class="main">
  <article class="log">
    <div class="meta">2024-03-06</div>
    <h3>
      <a href="https://nodesdz.com/?id=1187">3月6日 免费节点</a>
    </h3>
  </article>
  <article class="log">
    <h3><a href="https://nodesdz.com/?id=1186">3月5日 免费节点</a></h3>
  </article>
</div>"#;

    const ARTICLE_PAGE: &str = r#"
<script>
var links = {
  v2ray: "https://dl.nodesdz.com/sub/20240306.txt",
  clash: "https://dl.nodesdz.com/clash/b831381d-6324-4d53-ad4f-8cda48b30811.yaml"
};
</script>"#;

    #[test]
    fn test_extract_latest_article_id() {
        assert_eq!(extract_latest_article_id(HOME_PAGE), Some("1187"));
        assert_eq!(extract_latest_article_id("<html></html>"), None);
    }

    #[test]
    fn test_extract_clash_url() {
        assert_eq!(
            extract_clash_url(ARTICLE_PAGE),
            Some("https://dl.nodesdz.com/clash/b831381d-6324-4d53-ad4f-8cda48b30811.yaml")
        );
        assert_eq!(extract_clash_url("clash: \"ftp://x\""), None);
    }

    #[test]
    fn test_extract_uuid() {
        assert_eq!(
            extract_uuid(ARTICLE_PAGE).map(|u| u.to_string()),
            Some("b831381d-6324-4d53-ad4f-8cda48b30811".to_string())
        );
        assert_eq!(extract_uuid(HOME_PAGE), None);
    }

    #[test]
    fn test_daily_article_id() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        assert_eq!(daily_article_id(1000, "2024-03-01", today).unwrap(), 1005);
        assert_eq!(daily_article_id(1000, "2024-03-06", today).unwrap(), 1000);
        assert!(matches!(
            daily_article_id(1000, "2024-03-07", today),
            Err(SourceError::FutureBaseDate(_))
        ));
        assert!(matches!(
            daily_article_id(1000, "03/01/2024", today),
            Err(SourceError::InvalidBaseDate(_))
        ));
    }

    #[test]
    fn test_template_nodes() {
        let uuid = Uuid::parse_str("b831381d-6324-4d53-ad4f-8cda48b30811").unwrap();
        let templates = vec![
            TemplateNode::new("awshk.freenodes01.cc", "🇭🇰 香港"),
            TemplateNode::new("awsjp.freenodes01.cc", "🇯🇵 日本"),
        ];
        let nodes = template_nodes(&uuid, &templates, &NormalizeSettings::default());

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].server, "awshk.freenodes01.cc");
        assert_eq!(nodes[0].port, 443);
        assert_eq!(nodes[0].identifier, "b831381d-6324-4d53-ad4f-8cda48b30811");
        assert_eq!(nodes[1].name, "🇯🇵 日本");
        assert!(nodes.iter().all(NodeRecord::is_reality));
        assert_eq!(nodes[0].sni.as_deref(), Some("www.microsoft.com"));
    }
}
