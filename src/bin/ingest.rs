use clap::Parser;
use modgraph::Config;
use modgraph::ingest::IngestPipeline;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Fetch a module graph from the graph API and load it into the graph store")]
struct Args {
    /// Override `source.module_ids` from the config file (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    module_ids: Vec<i64>,
}

async fn run(mut config: Config, args: Args) -> anyhow::Result<()> {
    if !args.module_ids.is_empty() {
        config.source.module_ids = args.module_ids;
    }
    log::info!("Configuration loaded successfully");
    log::info!("Graph API: {}", config.source.host);
    log::info!("Database path: {}", config.db_path().display());

    let start = Instant::now();
    let report = IngestPipeline::from_config(&config)?.run().await?;

    log::info!("=== Ingestion Complete ===");
    log::info!("Nodes loaded: {}", report.nodes);
    log::info!("Edges loaded: {}", report.edges);
    if report.skipped_edges > 0 {
        log::info!("Edges skipped (unknown endpoint): {}", report.skipped_edges);
    }
    log::info!("Time: {:?}", start.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // RUST_LOG still wins over `logging.log_level`.
    let config = Config::load();
    let level = config
        .as_ref()
        .map(|c| c.logging.log_level.as_str())
        .unwrap_or("info");
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", level)
    ).init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Starting module graph ingestion");

    match run(config, args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Ingestion failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
