pub mod delete;
pub mod distance;
pub mod ingest;
pub mod list;

use anyhow::{Context, Result};
use gis::{open_store, OpenedStore, StoreConfigBuilder};

/// Open the feature store from flags, falling back to `GIS_*` variables.
pub async fn connect(
    database_url: Option<String>,
    max_connections: u32,
) -> Result<OpenedStore> {
    let mut builder = StoreConfigBuilder::from_env()?.max_connections(max_connections);
    if let Some(url) = database_url {
        builder = builder.database_url(url);
    }

    let config = builder.build().context(
        "GIS_DATABASE_URL environment variable not set. Use --database-url or set GIS_DATABASE_URL",
    )?;

    open_store(&config)
        .await
        .context("Failed to open feature store")
}
