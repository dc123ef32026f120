use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use testenv_cli::{args::Cli, commands::bootstrap_cmd};

#[tokio::main]
async fn main() {
    // Initialize logging; stdout is reserved for the step announcements
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_env("TESTENV_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing required flags exit here with a usage error, before any side effect
    let cli = Cli::parse();

    match bootstrap_cmd::execute(&cli).await {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            error!("Error: {e}");
            std::process::exit(1);
        }
    }
}
