use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use log::{debug, info, warn};
use thiserror::Error;

use crate::generator::{proxy_to_json, proxy_to_single};
use crate::models::NodeRecord;
use crate::parser::explodes::ExplodeStats;
use crate::settings::{Settings, SettingsError};
use crate::sources::{collect, parse_content, SourceError, SourceOutput};
use crate::utils::file::{file_get, file_write};
use crate::utils::http::{FetchError, Fetcher};
use crate::utils::node_manip::{
    append_date_suffix, date_suffix, dedup_nodes, number_duplicates, rename_nodes,
};

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to read input file {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse input file: {0}")]
    Parse(#[from] SourceError),

    #[error("No source produced any input")]
    NoInput,

    #[error("Failed to serialize nodes: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Summary of one harvest run
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub stats: ExplodeStats,
    pub duplicates_removed: usize,
    pub nodes: Vec<NodeRecord>,
    pub json_path: Option<PathBuf>,
    pub subscription_path: Option<PathBuf>,
    /// False when input was fetched but yielded no nodes
    pub written: bool,
}

/// Expands `{date}` in an output file name to `YYYYMMDD`.
pub fn expand_output_name(name: &str, now: &DateTime<FixedOffset>) -> String {
    name.replace("{date}", &now.format("%Y%m%d").to_string())
}

async fn gather(
    settings: &Settings,
    suffix: &str,
    report: &mut HarvestReport,
) -> Result<SourceOutput, HarvestError> {
    let fetcher = Fetcher::new(&settings.http, &settings.cache)?;
    let mut gathered = SourceOutput::default();

    for source in &settings.sources {
        match collect(source, &fetcher, settings).await {
            Ok(mut output) => {
                info!(
                    "Source {}: {} nodes ({} candidates, {} failed, {} filtered)",
                    source.label(),
                    output.nodes.len(),
                    output.stats.candidates,
                    output.stats.failed,
                    output.stats.filtered
                );
                if source.name_suffix_date() {
                    append_date_suffix(&mut output.nodes, suffix);
                }
                report.sources_ok += 1;
                gathered.extend(output);
            }
            Err(e) => {
                warn!("Source {} failed: {}", source.label(), e);
                report.sources_failed += 1;
            }
        }
    }

    if report.sources_ok == 0 {
        return Err(HarvestError::NoInput);
    }
    Ok(gathered)
}

fn read_input(path: &Path, settings: &Settings) -> Result<SourceOutput, HarvestError> {
    info!("Reading nodes from {}", path.display());
    let content = file_get(path).map_err(|source| HarvestError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_content(&content, settings)?)
}

fn write_output(path: &Path, content: &str) -> Result<(), HarvestError> {
    file_write(path, content).map_err(|source| HarvestError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Runs one harvest: gather nodes from the configured sources (or from
/// `input` when given), dedup and rename them, then write the JSON dump and
/// the base64 subscription.
pub async fn harvest(
    settings: &Settings,
    input: Option<&Path>,
) -> Result<HarvestReport, HarvestError> {
    settings.validate()?;
    let now = settings.local_now()?;
    let suffix = date_suffix(&settings.rename, &now);
    let mut report = HarvestReport::default();

    let gathered = match input {
        Some(path) => {
            let output = read_input(path, settings)?;
            report.sources_ok = 1;
            output
        }
        None => gather(settings, &suffix, &mut report).await?,
    };
    report.stats = gathered.stats;
    let mut nodes = gathered.nodes;

    report.duplicates_removed = dedup_nodes(&mut nodes);
    rename_nodes(&mut nodes, &settings.rename, &suffix);
    number_duplicates(&mut nodes);
    debug!("{} nodes after dedup and rename", nodes.len());

    if nodes.is_empty() {
        warn!(
            "Input was fetched but no usable nodes were found ({} candidates, {} failed, {} filtered); nothing written",
            report.stats.candidates, report.stats.failed, report.stats.filtered
        );
        return Ok(report);
    }

    let out_dir = PathBuf::from(&settings.output.dir);
    let json_path = out_dir.join(expand_output_name(&settings.output.json_name, &now));
    let subscription_path =
        out_dir.join(expand_output_name(&settings.output.subscription_name, &now));

    write_output(&json_path, &proxy_to_json(&nodes)?)?;
    write_output(
        &subscription_path,
        &proxy_to_single(&nodes, &settings.normalize),
    )?;

    info!("Saved {} nodes", nodes.len());
    report.json_path = Some(json_path);
    report.subscription_path = Some(subscription_path);
    report.nodes = nodes;
    report.written = true;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expand_output_name() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 6, 9, 30, 0).unwrap();
        assert_eq!(expand_output_name("nodes-{date}.json", &now), "nodes-20240306.json");
        assert_eq!(expand_output_name("good.txt", &now), "good.txt");
    }

    #[tokio::test]
    async fn test_harvest_without_sources_fails() {
        let settings = Settings {
            sources: Vec::new(),
            ..Settings::default()
        };
        assert!(matches!(
            harvest(&settings, None).await,
            Err(HarvestError::NoInput)
        ));
    }
}
