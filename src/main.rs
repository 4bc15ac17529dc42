//! CD3S command line: run the analysis API or analyze a batch file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use cd3s::api::{start_analysis_server, ApiContext};
use cd3s::config::{self, ServiceConfig};
use cd3s::intelligence::{analyze_async, DefaultDriftEngine, GuidelineCatalog};
use cd3s::models::PriorScores;
use cd3s::store::{EventSource, JsonFileEventSource};

#[derive(Parser)]
#[command(name = "cd3s")]
#[command(version, about = "Clinical pathway drift analysis", long_about = None)]
struct Cli {
    /// Service configuration file (overrides $CD3S_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the analysis API until interrupted
    Serve {
        /// Bind address (e.g. 127.0.0.1:8787)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Analyze a JSON array of clinical events and print the result
    Analyze {
        /// Path to the events file
        events: PathBuf,

        /// Guideline id from the catalog
        #[arg(short, long, default_value = "NSCLC-v2025")]
        guideline: String,

        /// Prior scores file used as the trend reference
        #[arg(short, long)]
        baseline: Option<PathBuf>,
    },

    /// List the guidelines in the catalog
    Guidelines,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Analysis(#[from] cd3s::intelligence::AnalysisError),
    #[error(transparent)]
    Store(#[from] cd3s::store::StoreError),
    #[error(transparent)]
    Server(#[from] cd3s::api::ServerError),
    #[error("Baseline file {path}: {detail}")]
    Baseline { path: String, detail: String },
    #[error("Output failed: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    cd3s::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let service = match &cli.config {
        Some(path) => ServiceConfig::load_from(path)?,
        None => ServiceConfig::load()?,
    };
    let catalog = GuidelineCatalog::load(&service.resources_dir())?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| service.bind_addr.clone());
            let engine = DefaultDriftEngine::new(service.engine.clone())?;
            let ctx = ApiContext::new(engine, catalog, service.request_deadline());

            tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
            let mut server = start_analysis_server(ctx, &bind).await?;
            println!("Listening on http://{}/api", server.session.server_addr);

            tokio::signal::ctrl_c().await?;
            server.shutdown();
        }

        Commands::Analyze {
            events,
            guideline,
            baseline,
        } => {
            let engine = std::sync::Arc::new(DefaultDriftEngine::new(service.engine.clone())?);
            let batch = JsonFileEventSource::new(events).load_events()?;
            let guideline = catalog.resolve(&guideline)?.clone();
            let baseline = baseline.map(|p| load_baseline(&p)).transpose()?;

            let result = analyze_async(
                engine,
                batch,
                guideline,
                baseline,
                service.request_deadline(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Guidelines => {
            for g in catalog.list() {
                println!("{}\t{}", g.id, g.name);
            }
        }
    }

    Ok(())
}

fn load_baseline(path: &std::path::Path) -> Result<PriorScores, CliError> {
    let err = |detail: String| CliError::Baseline {
        path: path.display().to_string(),
        detail,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| err(e.to_string()))
}
