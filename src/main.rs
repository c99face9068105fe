//! Binary entry point: one acquisition run per invocation.

use std::process;

use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use magpie::{
    Credentials, DiscordWebhook, LaunchError, LaunchOrchestrator, LauncherConfig, OciBackend,
    Outcome,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("credentials error: {0}")]
    Credentials(String),
    #[error("run failed: {0}")]
    Launch(#[from] LaunchError),
}

async fn run() -> Result<Outcome, CliError> {
    let config =
        LauncherConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    config
        .validate()
        .map_err(|err| CliError::Config(err.to_string()))?;

    let credentials = Credentials::load(&config.credentials_file, &config.credentials_profile)
        .map_err(|err| CliError::Credentials(err.to_string()))?;
    let backend = OciBackend::new(credentials);
    let notifier = DiscordWebhook::new(&config.webhook_url);

    let orchestrator = LaunchOrchestrator::new(backend, notifier);
    Ok(orchestrator.execute(&config).await?)
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(outcome) => info!(?outcome, "run finished"),
        Err(err) => {
            error!("{err}");
            process::exit(1);
        }
    }
}
