use clap::Parser;

use eduflow_api::cli::{self, Cli};
use eduflow_api::{config, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = config::config();
    logging::init_subscriber(&config.logging)?;
    tracing::info!("Starting EduFlow API in {:?} mode", config.environment);

    if let Err(e) = cli::run(cli, config).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
