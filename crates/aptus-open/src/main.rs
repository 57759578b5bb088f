//! aptus-open: unlock apartment doors over a local HTTP API.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aptus_open::{AptusError, AptusServer, Config};
use aptus_session::SessionManager;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aptus-open")]
#[command(about = "Unlock apartment doors through the aptus tenant portal", version)]
struct Cli {
    /// Path to the secrets TOML file
    #[arg(short, long, env = "APTUS_SECRETS_FILE")]
    secrets_file: PathBuf,

    /// Port to listen on (overrides the secrets file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to listen on (overrides the secrets file)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aptus_open=info,aptus_session=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aptus-open stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AptusError> {
    let mut config = Config::load(&cli.secrets_file)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    info!(
        secrets = %cli.secrets_file.display(),
        doors = config.secrets.doors.len(),
        "starting aptus-open"
    );

    let span = tracing::info_span!("session", user = %config.secrets.credentials.username);
    let manager = SessionManager::builder(config.secrets.clone())
        .config(config.session_config()?)
        .span(span)
        .open()
        .await?;

    let server = AptusServer::builder()
        .bind(&config.server.addr())
        .build(Arc::new(manager))
        .await?;
    server.run().await
}
