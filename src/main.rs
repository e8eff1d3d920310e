use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use nodesub::{harvest, Settings};

/// Scrape free proxy node aggregators into a JSON dump and a base64 subscription
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (defaults to nodesub.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for the generated files, overriding the configuration
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Parse a local file of links or Clash YAML instead of scraping
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
}

async fn run(args: Args) -> Result<()> {
    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(dir) = args.output_dir {
        settings.output.dir = dir.to_string_lossy().into_owned();
    }

    let report = harvest(&settings, args.input.as_deref())
        .await
        .context("Harvest failed")?;

    info!(
        "Done: {} sources ok, {} failed, {} nodes parsed, {} duplicates removed",
        report.sources_ok, report.sources_failed, report.stats.parsed, report.duplicates_removed
    );
    if let (Some(json), Some(sub)) = (&report.json_path, &report.subscription_path) {
        info!("Outputs: {} and {}", json.display(), sub.display());
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
