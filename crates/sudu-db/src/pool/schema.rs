//! Schema bootstrap

use sqlx::PgPool;
use tracing::info;

const CREDENTIALS_SCHEMA: &str = include_str!("../../migrations/0001_credentials.sql");

/// Create the credential tables and indexes when missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREDENTIALS_SCHEMA).execute(pool).await?;
    info!("Credential schema ready");
    Ok(())
}
