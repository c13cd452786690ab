//! fvr-engine - Food venue recommender
//!
//! Commands:
//! - `run`: load the survey CSV, run the pipeline once, export the result CSV
//! - `serve`: build the table, then serve it over HTTP with `POST /api/reload`
//! - `score`: print the fuzzy inference trace for one price/distance/taste triple
//! - `init-config`: write the effective configuration as TOML
//!
//! Configuration: `--config` → `FVR_CONFIG` → `~/.config/fvr/config.toml` →
//! compiled defaults; command-line flags override file values.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fvr_common::config::{default_config_path, load_config, write_toml_config, TomlConfig};
use fvr_engine::fuzzy::ScoreInputs;
use fvr_engine::io::{export_table, load_observations};
use fvr_engine::{AppState, Pipeline, ResultStore};
use tokio::signal;
use tracing::{error, info, warn};

/// Command-line arguments for fvr-engine
#[derive(Parser, Debug)]
#[command(name = "fvr-engine")]
#[command(about = "Food venue clustering and fuzzy recommendation scoring")]
#[command(version)]
struct Cli {
    /// Config file (overrides FVR_CONFIG and the per-user file)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level directive (overrides [logging] level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and export the result table
    Run {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Serve the result table over HTTP
    Serve {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Score one price/distance/taste triple and print the inference trace
    Score {
        /// Price (currency units)
        #[arg(long)]
        price: f64,
        /// Distance (meters)
        #[arg(long)]
        distance: f64,
        /// Taste rating (1-5)
        #[arg(long)]
        taste: f64,
    },
    /// Write the effective configuration to a TOML file
    InitConfig {
        /// Target file (defaults to --config, then the per-user config path)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Survey CSV to read
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Result CSV to write
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Number of clusters (k)
    #[arg(short = 'k', long)]
    clusters: Option<usize>,
    /// Seed for centroid initialisation
    #[arg(long)]
    seed: Option<u64>,
}

impl DataArgs {
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(input) = &self.input {
            config.data.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.data.output = output.clone();
        }
    }
}

impl PipelineArgs {
    fn apply(&self, config: &mut TomlConfig) {
        if let Some(clusters) = self.clusters {
            config.pipeline.clusters = clusters;
        }
        if let Some(seed) = self.seed {
            config.pipeline.seed = seed;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, source) =
        load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    fvr_common::logging::init_tracing(&config.logging)?;

    info!(
        "Starting fvr-engine v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Loaded before the subscriber existed; report the outcome now
    if source.is_fallback() {
        warn!("{}", source.describe());
    } else {
        info!("{}", source.describe());
    }

    match cli.command {
        Command::Run { data, pipeline } => {
            data.apply(&mut config);
            pipeline.apply(&mut config);
            run_once(&config).await
        }
        Command::Serve {
            data,
            pipeline,
            host,
            port,
        } => {
            data.apply(&mut config);
            pipeline.apply(&mut config);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config).await
        }
        Command::Score {
            price,
            distance,
            taste,
        } => score(&config, price, distance, taste),
        Command::InitConfig { path, force } => {
            let target = path
                .or(cli.config)
                .or_else(default_config_path)
                .context("No config path given and no per-user config directory")?;
            if target.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", target.display());
            }
            write_toml_config(&config, &target)?;
            info!("Wrote configuration to {}", target.display());
            Ok(())
        }
    }
}

/// Batch mode: load → pipeline → export
async fn run_once(config: &TomlConfig) -> Result<()> {
    let pipeline = Pipeline::from_toml(config)?;
    let observations = load_observations(&config.data.input).await?;

    let table = tokio::task::spawn_blocking(move || pipeline.run(&observations))
        .await
        .context("Pipeline task failed")??;
    export_table(&table, &config.data.output).await?;

    for summary in table.summaries() {
        info!(
            "Cluster {} '{}': {} venues, mean price {:.0}",
            summary.id, summary.label, summary.size, summary.mean_price
        );
    }
    Ok(())
}

/// Print the inference trace for one triple as JSON on stdout
fn score(config: &TomlConfig, price: f64, distance: f64, taste: f64) -> Result<()> {
    let inputs = ScoreInputs::checked(price, distance, taste)?;
    let pipeline = Pipeline::from_toml(config)?;
    let trace = pipeline.engine().explain(inputs);
    if trace.score.is_none() {
        warn!(
            "No rule fired; the pipeline would score {}",
            pipeline.config().fallback_score
        );
    }
    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}

/// HTTP mode
async fn serve(config: &TomlConfig) -> Result<()> {
    let pipeline = Pipeline::from_toml(config)?;
    let store = ResultStore::new(pipeline, config.data.input.clone())
        .with_output(config.data.output.clone());

    // Serve even if the first build fails; /health reports the error
    if let Err(e) = store.rebuild().await {
        warn!("Initial build failed, serving an empty table: {}", e);
    }

    let state = AppState::new(store, config.query.default_limit);
    let app = fvr_engine::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
