use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, TenantId};
use crate::server::{run_server, AppState};
use crate::services::mail::LogMailer;
use crate::services::provisioner;

#[derive(Parser)]
#[command(name = "eduflow-api")]
#[command(about = "EduFlow API - multi-tenant institute management backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides EDUFLOW_API_PORT / PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create missing tables and seed data for an existing institute")]
    Provision {
        #[arg(long, help = "Institute number to provision")]
        institute: String,
    },
}

/// How often `serve` retries migrations while the database is unreachable
const MIGRATION_RETRY: Duration = Duration::from_secs(5);

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if config.security.jwt_secret.is_empty() {
                anyhow::bail!("JWT_SECRET must be set outside development");
            }

            // Start listening even if Postgres is not up yet; /health reports it
            match DatabaseManager::migrate(&pool).await {
                Ok(()) => {}
                Err(e) if e.is_unavailable() => {
                    tracing::warn!("Database unreachable at startup, migrating in the background: {}", e);
                    tokio::spawn(DatabaseManager::migrate_until_ready(pool.clone(), MIGRATION_RETRY));
                }
                Err(e) => return Err(e.into()),
            }

            let state = AppState {
                pool,
                mailer: Arc::new(LogMailer),
            };
            run_server(state, config, port.unwrap_or(config.api.port)).await
        }
        Commands::Provision { institute } => {
            let tenant = TenantId::parse(&institute)?;
            DatabaseManager::migrate(&pool).await?;
            provisioner::ensure_tables(&pool, tenant).await?;
            tracing::info!(tenant = %tenant, "Institute tables are up to date");
            println!("Institute {} provisioned", tenant);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["eduflow-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_provision_command() {
        let cli = Cli::try_parse_from(["eduflow-api", "provision", "--institute", "4821"]).unwrap();
        match cli.command {
            Some(Commands::Provision { institute }) => assert_eq!(institute, "4821"),
            _ => panic!("expected provision command"),
        }
    }

    #[test]
    fn parses_serve_port() {
        let cli = Cli::try_parse_from(["eduflow-api", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(8080) })));
    }
}
