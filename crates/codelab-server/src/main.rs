//! Codelab backend server
//!
//! Runs learner submissions under a deadline and serves the challenge,
//! profile and progress routes used by the site.

use anyhow::{Context, Result};
use clap::Parser;
use codelab_core::{
    ChallengeCatalog, CodelabConfig, ConfigLoader, InMemoryRowStore, LocalProcessExecutor,
};
use codelab_http::{shutdown_signal, AppState, CodelabServer, ServerConfig};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Codelab Server - Run submitted code and track challenge progress"
)]
struct Cli {
    #[clap(
        long,
        short,
        default_value = "codelab.yaml",
        help = "Path to the YAML configuration file; defaults apply when it does not exist"
    )]
    config: PathBuf,

    #[clap(long, help = "Address to listen on, e.g. 127.0.0.1:5000")]
    bind_addr: Option<String>,

    #[clap(long, help = "Interpreter used to run submissions")]
    interpreter: Option<String>,

    #[clap(long, help = "Execution deadline in seconds")]
    timeout: Option<f64>,

    #[clap(
        long,
        help = "Directory for materialized submissions (OS temp dir by default)"
    )]
    temp_dir: Option<PathBuf>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Flags win over the file and the environment.
    fn apply_overrides(&self, config: &mut CodelabConfig) {
        if let Some(ref addr) = self.bind_addr {
            config.server.bind_addr = addr.clone();
        }
        if let Some(ref interpreter) = self.interpreter {
            config.execution.interpreter = interpreter.clone();
        }
        if let Some(timeout) = self.timeout {
            config.execution.timeout_secs = timeout;
        }
        if let Some(ref dir) = self.temp_dir {
            config.execution.temp_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let config = load_config(&cli).await?;
    run_server(config).await
}

/// File and environment first, then flags; validated once at the end.
async fn load_config(cli: &Cli) -> Result<CodelabConfig> {
    let mut config = ConfigLoader::read_or_default(&cli.config)
        .await
        .with_context(|| {
            format!(
                "Failed to load configuration from {}",
                cli.config.display()
            )
        })?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_server(config: CodelabConfig) -> Result<()> {
    let deadline = config.execution.timeout();
    if deadline > Duration::from_secs(60) {
        log::warn!("Execution deadline of {:?} is unusually long", deadline);
    }
    if which_interpreter(&config.execution.interpreter).is_none() {
        log::warn!(
            "Interpreter '{}' was not found on PATH; submissions will report a launch error",
            config.execution.interpreter
        );
    }

    log::info!(
        "Running submissions with '{}' (deadline {:?}, sources in {})",
        config.execution.interpreter,
        deadline,
        config.execution.source_dir().display()
    );

    let executor = LocalProcessExecutor::new(config.execution.clone());
    let state = AppState::new(Arc::new(executor), Arc::new(InMemoryRowStore::new()))
        .with_catalog(ChallengeCatalog::builtin())
        .with_default_expected_output(&config.evaluation.default_expected_output);

    let server_config = ServerConfig::from_section(&config.server)?;
    log::info!("Starting codelab server on {}...", server_config.bind_addr);

    let server = CodelabServer::with_config(state, server_config);

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        log::error!("Server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Resolve an interpreter name the way the spawn will, for a startup hint only.
fn which_interpreter(interpreter: &str) -> Option<PathBuf> {
    which::which(interpreter).ok()
}
