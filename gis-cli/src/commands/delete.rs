use anyhow::{bail, Context, Result};
use gis::FeatureStore;
use std::sync::Arc;

pub async fn run(store: Arc<dyn FeatureStore>, id: i64) -> Result<()> {
    let deleted = store
        .delete_point(id)
        .await
        .context("Failed to delete point")?;

    if !deleted {
        bail!("No point with osm_id {}", id);
    }

    println!("Deleted point {}", id);
    Ok(())
}
