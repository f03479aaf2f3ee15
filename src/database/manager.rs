use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::database::tenant::TableNameError;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid tenant table name: {0}")]
    InvalidTableName(#[from] TableNameError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate value violates {0}")]
    UniqueViolation(String),

    #[error("Referenced row does not exist ({0})")]
    ForeignKeyViolation(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("constraint").to_string();
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => return DatabaseError::UniqueViolation(constraint),
                Some(PG_FOREIGN_KEY_VIOLATION) => return DatabaseError::ForeignKeyViolation(constraint),
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl DatabaseError {
    /// True when the server could not be reached, as opposed to rejecting a statement
    pub fn is_unavailable(&self) -> bool {
        match self {
            DatabaseError::Sqlx(err) | DatabaseError::Migration(sqlx::migrate::MigrateError::Execute(err)) => matches!(
                err,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

/// Builds and checks the shared connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create the pool without opening a connection; the first query connects.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Self::validate_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(url)?;

        info!(
            "Configured database pool (max_connections={}, acquire_timeout={}s)",
            config.max_connections, config.acquire_timeout_secs
        );
        Ok(pool)
    }

    /// Create the shared `users` / `institutes` catalog
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Shared catalog migrations applied");
        Ok(())
    }

    /// Keep retrying migrations while the database is unreachable.
    ///
    /// Gives up on the first error that is not a connectivity failure.
    pub async fn migrate_until_ready(pool: PgPool, retry_every: Duration) {
        loop {
            match Self::migrate(&pool).await {
                Ok(()) => return,
                Err(e) if e.is_unavailable() => {
                    warn!("Database still unreachable, retrying migrations in {:?}: {}", retry_every, e);
                    tokio::time::sleep(retry_every).await;
                }
                Err(e) => {
                    error!("Shared catalog migrations failed: {}", e);
                    return;
                }
            }
        }
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn validate_url(raw: &str) -> Result<(), DatabaseError> {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }
}
