use log::info;

use super::{parse_content, SourceError, SourceOutput};
use crate::settings::Settings;
use crate::utils::http::Fetcher;

/// Downloads a subscription URL and parses it as Clash YAML or a link list.
///
/// The Clash user agent is sent so providers that tailor their response
/// return YAML, which carries the richest node fields.
pub async fn collect(
    url: &str,
    fetcher: &Fetcher,
    settings: &Settings,
) -> Result<SourceOutput, SourceError> {
    info!("Downloading subscription {}", url);
    let content = fetcher.get_clash(url).await?;
    parse_content(&content, settings)
}
