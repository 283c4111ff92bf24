use std::sync::Arc;

use anyhow::Context;
use cinedex::{config::Config, db, harvest::Harvester, store::CatalogStore, tmdb::TmdbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,cinedex=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = reqwest::Client::builder()
        .user_agent("cinedex/0.1")
        .build()
        .context("building http client")?;

    let db = db::connect_and_migrate(&config.database_url)
        .await
        .context("connecting to database")?;
    let store = CatalogStore::new(db);

    let tmdb = Arc::new(TmdbClient::new(http, &config));

    let harvester = Harvester::new(tmdb, store, &config);
    let total = harvester.run().await.context("harvest run failed")?;

    tracing::info!(total = total, "done");

    Ok(())
}
