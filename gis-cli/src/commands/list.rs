use anyhow::{Context, Result};
use clap::ValueEnum;
use gis::FeatureStore;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;

/// A readable OSM layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layer {
    /// Named points
    Points,
    /// Roads with a highway classification
    Roads,
    /// Named polygons
    Polygons,
}

pub async fn run(store: Arc<dyn FeatureStore>, layer: Layer) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    let count = match layer {
        Layer::Points => {
            let rows = store.list_points().await.context("Failed to list points")?;
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            rows.len()
        }
        Layer::Roads => {
            let rows = store.list_roads().await.context("Failed to list roads")?;
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            rows.len()
        }
        Layer::Polygons => {
            let rows = store
                .list_polygons()
                .await
                .context("Failed to list polygons")?;
            serde_json::to_writer_pretty(&mut writer, &rows)?;
            rows.len()
        }
    };

    writeln!(writer)?;
    writer.flush()?;

    eprintln!("Listed {} {:?}", count, layer);
    Ok(())
}
