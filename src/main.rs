use anyhow::Context;
use clap::Parser;
use harvester::{read_config, run_batch, HarvestContext, InMemoryService, ObjectShadow};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG: &str = "harvester.json";
const DEFAULT_SERVICE: &str = "service.json";

/// Harvester - reconcile object shadows against a content service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding an array of object shadows
    #[arg(short, long, env = "HARVESTER_SHADOWS")]
    shadows: PathBuf,

    /// Service snapshot to reconcile against. Written back after the batch.
    #[arg(long, env = "HARVESTER_SERVICE", default_value = DEFAULT_SERVICE)]
    service: PathBuf,

    /// Configuration file. Flags below override it.
    #[arg(short, long, env = "HARVESTER_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Resolve objects only; never create or change anything
    #[arg(long)]
    no_shadow_commit: bool,

    /// Skip objects that have no file shadows attached
    #[arg(long)]
    require_files_on_objects: bool,

    /// Stop at the first object that fails
    #[arg(long)]
    fail_fast: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "HARVESTER_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = read_config(&args.config)
        .await
        .with_context(|| format!("reading config {}", args.config.display()))?
        .unwrap_or_default();
    config.no_shadow_commit |= args.no_shadow_commit;
    config.require_files_on_objects |= args.require_files_on_objects;
    config.continue_on_error &= !args.fail_fast;

    let content = fs::read_to_string(&args.shadows)
        .await
        .with_context(|| format!("reading shadows {}", args.shadows.display()))?;
    let mut shadows: Vec<ObjectShadow> = serde_json::from_str(&content)
        .with_context(|| format!("parsing shadows {}", args.shadows.display()))?;

    let service = Arc::new(
        InMemoryService::load(&args.service)
            .await
            .with_context(|| format!("loading service snapshot {}", args.service.display()))?,
    );

    info!(
        shadows = shadows.len(),
        no_shadow_commit = config.no_shadow_commit,
        require_files_on_objects = config.require_files_on_objects,
        "Starting harvest"
    );

    let ctx = HarvestContext::new(service.clone(), config.runtime_options());
    let report = run_batch(&ctx, &mut shadows, config.continue_on_error).await;

    // Whatever was committed before a failure is already in the service
    if !config.no_shadow_commit {
        service
            .save(&args.service)
            .await
            .with_context(|| format!("saving service snapshot {}", args.service.display()))?;
    }

    let report = report?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}
