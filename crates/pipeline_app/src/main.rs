mod platform;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use pipeline_logging::engine_info;

use platform::{run_app, AppSettings, RunRequest, DEFAULT_SETTINGS_FILE};

/// Track a document pipeline job and review the segments it produces.
#[derive(Debug, Parser)]
#[command(name = "pipeline_app", version)]
struct Cli {
    /// Settings file (RON). Missing file means defaults.
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Backend base URL, overrides the settings file.
    #[arg(long)]
    base_url: Option<String>,
    /// Backend task id to poll.
    #[arg(long)]
    job_id: Option<String>,
    /// Cleaned text to segment (after the job completes when --job-id is given).
    #[arg(long)]
    text_file: Option<PathBuf>,
    /// Document the text belongs to.
    #[arg(long)]
    file_id: Option<String>,
    /// Re-poll interval in milliseconds, overrides the settings file.
    #[arg(long)]
    interval_ms: Option<u64>,
    /// Save the segments on the backend once segmentation finishes.
    #[arg(long)]
    confirm: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.job_id.is_none() && cli.text_file.is_none() {
        bail!("nothing to do: pass --job-id and/or --text-file");
    }

    let (mut settings, found) = AppSettings::load(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        settings.api.base_url = base_url;
    }
    if let Some(interval_ms) = cli.interval_ms {
        settings.poller.interval_ms = interval_ms;
    }

    pipeline_logging::initialize(settings.log_destination()?, settings.log_level()?);
    if found {
        engine_info!("Loaded settings from {:?}", cli.config);
    }

    let source_text = match &cli.text_file {
        Some(path) => Some(
            fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?,
        ),
        None => None,
    };

    run_app(
        &settings,
        RunRequest {
            job_id: cli.job_id,
            source_text,
            file_id: cli.file_id,
            confirm: cli.confirm,
        },
    )
}
