//! Runs pending SQLx migrations against the database.
//!
//! Migrations are embedded at compile time, so no migration files
//! are needed at runtime. The `api` binary applies them on startup too;
//! this exists for deploys that migrate as a separate step.

use sqlx::postgres::PgPoolOptions;

use spotsaver_common::Config;
use spotsaver_store::PgSpotRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    println!("Running database migrations...");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    PgSpotRepository::new(pool).migrate().await?;

    println!("Migrations completed successfully.");

    Ok(())
}
