//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use sqlx::PgPool;

/// Environment variable holding the connection string.
pub const DATABASE_URL_VAR: &str = "SD_DATABASE_URL";

/// Errors shared by every command that talks to the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Neither `SD_DATABASE_URL` nor `DATABASE_URL` is set.
    #[error("Missing environment variable: {DATABASE_URL_VAR} (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `SD_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let url = std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;
    let url = secrecy::SecretString::from(url);

    tracing::info!("Connecting to database...");
    let pool = storedesk_admin::db::create_pool(&url).await?;
    Ok(pool)
}
