//! # GIS - OpenStreetMap gateway core
//!
//! Ingestion and distance pipelines for a gateway in front of an
//! osm2pgsql-loaded PostGIS database.
//!
//! ## Features
//!
//! - **Batch ingestion**: [`BatchIngestor`] validates user-submitted points,
//!   gives each a negative [`SyntheticId`], projects it to EPSG:3857 and
//!   stores it. Bad items are skipped and reported, never fatal.
//! - **Path distance**: [`DistanceChainCalculator`] measures each consecutive
//!   pair of a path geodesically and sums the total.
//! - **Pluggable store**: both pipelines talk to a [`FeatureStore`];
//!   [`PgFeatureStore`] (feature `postgres`) for PostGIS, [`MemoryStore`]
//!   for tests and demos.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use gis::{BatchIngestor, Coordinate, DistanceChainCalculator, MemoryStore,
//!           PointSubmission, SyntheticIdAllocator};
//!
//! let store = Arc::new(MemoryStore::new());
//! let ingestor = BatchIngestor::new(store.clone(), Arc::new(SyntheticIdAllocator::new()));
//! let result = ingestor
//!     .ingest(vec![PointSubmission::new(Some("Cafe".into()), 55.75, 37.61)])
//!     .await;
//! assert_eq!(result.accepted_count, 1);
//!
//! let calculator = DistanceChainCalculator::new(store);
//! let report = calculator
//!     .compute_path(&[Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)])
//!     .await?;
//! println!("{:.1} m", report.total_distance);
//! ```
//!
//! ## Coordinate Reference Systems
//!
//! Callers speak WGS84 degrees (EPSG:4326). The osm2pgsql tables store
//! Web-Mercator meters (EPSG:3857). Distances are geodesic meters on the
//! WGS84 ellipsoid, never planar.

pub mod config;
pub mod distance;
pub mod error;
pub mod ids;
pub mod ingest;
pub mod model;
pub mod projection;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::{StoreBackend, StoreConfig, StoreConfigBuilder};
pub use distance::DistanceChainCalculator;
pub use error::{GisError, ProjectionError, Result, StoreError};
pub use ids::{IdSource, SyntheticId, SyntheticIdAllocator};
pub use ingest::{BatchIngestor, BatchResult, IngestOutcome, RejectReason, Rejection};
pub use model::{
    Coordinate, DistanceReport, PathSegment, PersistedPoint, PointFeature, PointSubmission,
    PolygonFeature, RoadFeature,
};
pub use projection::MercatorPoint;
#[cfg(feature = "postgres")]
pub use store::PgFeatureStore;
pub use store::{open_store, FeatureStore, MemoryStore, OpenedStore};
