use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use image_updater::config::{Config, DEFAULT_CONFIG_DIR};
use image_updater::logging::{self, LogFormat};
use image_updater::pipeline::{FilePipeline, GitHistory, History, Updater};
use image_updater::version::registries::{RegistrySet, build_client};
use image_updater::version::resolver::UpdateResolver;

#[derive(Parser)]
#[command(name = "image-updater")]
#[command(version, about = "Updates container image tags and commits each change")]
struct Cli {
    /// Directory holding update.yaml and update.private.yaml
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Folder with container definition files
    #[arg(long)]
    containers_folder: Option<PathBuf>,

    /// Maximum number of tags fetched per image
    #[arg(long)]
    limit: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Repository the updates are committed to
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Reset uncommitted changes before updating
    #[arg(long)]
    discard_changes: bool,

    /// Resolve updates without writing or committing
    #[arg(long)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t)]
    log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(folder) = &self.containers_folder {
            config.containers_folder = folder.clone();
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.log_format, cli.log_file.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&cli.config_dir)?;
    cli.apply_overrides(&mut config);
    let config = Arc::new(config);

    let client = build_client(config.timeout)?;
    let registries = Arc::new(RegistrySet::from_protocols(client, &config.registries));
    let resolver = Arc::new(UpdateResolver::new(config.clone(), registries));

    let history: Arc<dyn History> = Arc::new(GitHistory::new(&cli.repo));
    if cli.discard_changes {
        info!("Discarding uncommitted changes in {}", cli.repo.display());
        history.discard_changes().await?;
    }

    let pipeline = FilePipeline::new(resolver, history).with_dry_run(cli.dry_run);
    let summary = Updater::new(pipeline)
        .run(&config.containers_folder)
        .await?;

    info!(
        "Processed {} files, {} updates committed",
        summary.files, summary.updated
    );

    if !summary.is_success() {
        anyhow::bail!(
            "{} of {} container files failed",
            summary.failed.len(),
            summary.files
        );
    }

    Ok(())
}
