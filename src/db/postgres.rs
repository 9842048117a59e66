use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates a PostgreSQL connection pool
///
/// Every availability listing fans out into a rating and presence lookup per
/// title, so the pool size is taken from configuration.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}
