//! GIS Service - HTTP gateway to an OpenStreetMap PostGIS dataset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GIS_DATABASE_URL` | PostgreSQL connection string | Required for `postgres` |
//! | `GIS_STORE` | `postgres` or `memory` | `postgres` |
//! | `GIS_MAX_CONNECTIONS` | Pool size | 5 |
//! | `GIS_ACQUIRE_TIMEOUT_SECS` | Pool acquire timeout | 10 |
//! | `GIS_PORT` | HTTP server port | 8080 |
//! | `GIS_CORS_ORIGINS` | Comma-separated origins, `*` for any | `http://127.0.0.1:5500,http://localhost:5500` |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /api/v1/osm/points` - Named points
//! - `DELETE /api/v1/osm/points/{id}` - Delete a point
//! - `GET /api/v1/osm/roads` - Roads
//! - `GET /api/v1/osm/polygons` - Named polygons
//! - `POST /api/v1/osm/points/add` - Batch point upload
//! - `POST /api/v1/osm/distances` - Geodesic path length
//! - `GET /health` - Health check
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use gis::{open_store, StoreConfigBuilder};
use gis_service::{router, AppState, ServiceConfig};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gis_service=info,gis=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service_config = ServiceConfig::from_env();
    let store_config = StoreConfigBuilder::from_env()?.build()?;

    tracing::info!(
        backend = ?store_config.backend(),
        max_connections = store_config.max_connections(),
        port = service_config.port,
        cors = ?service_config.cors_origins,
        "Starting GIS service"
    );

    let state = Arc::new(AppState::from(open_store(&store_config).await?));

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(service_config.cors_origins.layer()),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], service_config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on Ctrl-C so in-flight requests can finish.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
