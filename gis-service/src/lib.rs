//! GIS Service Library
//!
//! HTTP handlers, router and OpenAPI document for the OSM gateway.
//! This library is used by both the gis-service binary and integration tests.

pub mod config;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use gis::{BatchIngestor, DistanceChainCalculator, FeatureStore, IdSource, OpenedStore};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Feature store for pass-through reads and deletes.
    pub store: Arc<dyn FeatureStore>,
    /// Point batch ingestion.
    pub ingestor: BatchIngestor,
    /// Path distance computation.
    pub calculator: DistanceChainCalculator,
}

impl AppState {
    /// Wire the pipelines to `store`, drawing identifiers from `ids`.
    pub fn new(store: Arc<dyn FeatureStore>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            ingestor: BatchIngestor::new(store.clone(), ids),
            calculator: DistanceChainCalculator::new(store.clone()),
            store,
        }
    }
}

impl From<OpenedStore> for AppState {
    fn from(opened: OpenedStore) -> Self {
        Self::new(opened.store, opened.ids)
    }
}

/// OpenAPI documentation for the GIS service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OSM GIS Gateway",
        version = "0.1.0",
        description = "REST gateway to an OpenStreetMap PostGIS dataset with point ingestion and path distances.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_points,
        handlers::delete_point,
        handlers::get_roads,
        handlers::get_polygons,
        handlers::add_points,
        handlers::post_distances,
        handlers::health_check,
    ),
    components(
        schemas(
            handlers::DistanceRequest,
            handlers::IngestResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            gis::PointSubmission,
            gis::PointFeature,
            gis::RoadFeature,
            gis::PolygonFeature,
            gis::PathSegment,
            gis::DistanceReport,
        )
    ),
    tags(
        (name = "osm", description = "OpenStreetMap layers, ingestion and distances"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the API router. Middleware (CORS, tracing) is layered on by the caller.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/v1/osm/points", get(handlers::get_points))
        .route("/api/v1/osm/points/add", post(handlers::add_points))
        .route("/api/v1/osm/points/:id", delete(handlers::delete_point))
        .route("/api/v1/osm/roads", get(handlers::get_roads))
        .route("/api/v1/osm/polygons", get(handlers::get_polygons))
        .route("/api/v1/osm/distances", post(handlers::post_distances))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

// Re-export commonly used types for convenience
pub use config::{CorsOrigins, ServiceConfig};
pub use handlers::{DistanceRequest, ErrorResponse, HealthResponse, IngestResponse};
