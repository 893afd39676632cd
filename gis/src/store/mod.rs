//! The feature store port.
//!
//! [`FeatureStore`] is everything the gateway needs from the spatial
//! database. The ingestion and distance pipelines receive it as an
//! `Arc<dyn FeatureStore>` so they can run against PostGIS in production
//! ([`PgFeatureStore`], `postgres` feature) and against [`MemoryStore`] in
//! tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Result, StoreError};
use crate::ids::IdSource;
use crate::model::{Coordinate, PersistedPoint, PointFeature, PolygonFeature, RoadFeature};

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgFeatureStore;

/// Access to the OSM point, road and polygon layers.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Insert one point. Fails with [`StoreError::Constraint`] if `osm_id` is taken.
    async fn insert_point(&self, point: &PersistedPoint) -> std::result::Result<(), StoreError>;

    /// Geodesic distance in meters between two WGS84 coordinates.
    async fn distance_between(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> std::result::Result<f64, StoreError>;

    /// All named points.
    async fn list_points(&self) -> std::result::Result<Vec<PointFeature>, StoreError>;

    /// Delete a point by `osm_id`. Returns whether a row was removed.
    async fn delete_point(&self, osm_id: i64) -> std::result::Result<bool, StoreError>;

    /// All roads that carry a `highway` value.
    async fn list_roads(&self) -> std::result::Result<Vec<RoadFeature>, StoreError>;

    /// All named polygons.
    async fn list_polygons(&self) -> std::result::Result<Vec<PolygonFeature>, StoreError>;
}

/// An opened store with the identifier source that belongs to it.
///
/// Both backends number new points from a sequence kept inside the store,
/// so every process writing to the same database shares one counter.
#[derive(Clone)]
pub struct OpenedStore {
    pub store: Arc<dyn FeatureStore>,
    pub ids: Arc<dyn IdSource>,
}

/// Open the store selected by `config`.
///
/// # Errors
///
/// Returns [`GisError::Config`](crate::GisError::Config) when the PostGIS backend is requested but the
/// crate was built without the `postgres` feature, and a store error when the
/// connection pool cannot be created.
pub async fn open_store(config: &StoreConfig) -> Result<OpenedStore> {
    match config.backend() {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory feature store; data will not persist");
            let store = Arc::new(MemoryStore::new());
            Ok(OpenedStore {
                store: store.clone(),
                ids: store,
            })
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let store = Arc::new(PgFeatureStore::connect(config).await?);
            Ok(OpenedStore {
                store: store.clone(),
                ids: store,
            })
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => Err(crate::error::GisError::Config(
            "PostGIS backend requires the `postgres` feature".to_string(),
        )),
    }
}
