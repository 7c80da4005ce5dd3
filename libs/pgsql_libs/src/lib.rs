use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Error, Pool, Postgres};

pub type DbPool = Pool<Postgres>;

pub async fn create_db_pool(
    db_url: String,
    min_connection: u32,
    max_connection: u32,
) -> Result<DbPool, Error> {
    PgPoolOptions::new()
        .min_connections(min_connection)
        .max_connections(max_connection)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&db_url)
        .await
}
