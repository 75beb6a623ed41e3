//! CLI subcommand implementations.

pub mod admin;
pub mod catalogue;
pub mod migrate;

use refill_server::config::{ConfigError, get_database_url};
use refill_server::store::PgStore;

/// Errors shared by every command that talks to the database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

const DATABASE_URL_VAR: &str = "REFILL_DATABASE_URL";

/// Connect to the configured document store.
pub async fn connect() -> Result<PgStore, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url(DATABASE_URL_VAR)
        .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_string()))?;

    tracing::info!("Connecting to database...");
    Ok(PgStore::connect(&database_url).await?)
}
