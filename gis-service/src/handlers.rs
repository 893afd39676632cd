//! HTTP request handlers for the OSM gateway.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gis::{
    Coordinate, DistanceReport, GisError, PointFeature, PointSubmission, PolygonFeature,
    Rejection, RoadFeature, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Body of `POST /api/v1/osm/distances`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DistanceRequest {
    /// Path positions as `[lon, lat]` pairs, in traversal order.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub points: Vec<Coordinate>,
}

/// Result of a point batch upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// Always `"ok"`; per-item failures are listed in `rejected`.
    pub status: String,
    /// Number of points inserted.
    pub inserted: usize,
    /// Skipped submissions with their position and reason.
    #[schema(value_type = Vec<Object>)]
    pub rejected: Vec<Rejection>,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// List named points.
#[utoipa::path(
    get,
    path = "/api/v1/osm/points",
    tag = "osm",
    responses(
        (status = 200, description = "Named points", body = Vec<PointFeature>),
        (status = 503, description = "Feature store unavailable", body = ErrorResponse)
    )
)]
pub async fn get_points(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_points().await {
        Ok(points) => (StatusCode::OK, Json(points)).into_response(),
        Err(e) => error_response(GisError::Store(e)),
    }
}

/// Delete a point by OSM identifier.
#[utoipa::path(
    delete,
    path = "/api/v1/osm/points/{id}",
    tag = "osm",
    params(("id" = i64, Path, description = "OSM identifier of the point")),
    responses(
        (status = 204, description = "Point deleted"),
        (status = 404, description = "No point with this identifier", body = ErrorResponse),
        (status = 503, description = "Feature store unavailable", body = ErrorResponse)
    )
)]
pub async fn delete_point(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.store.delete_point(id).await {
        Ok(true) => {
            tracing::info!(osm_id = id, "Point deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("point {id} not found"),
            }),
        )
            .into_response(),
        Err(e) => error_response(GisError::Store(e)),
    }
}

/// List roads.
#[utoipa::path(
    get,
    path = "/api/v1/osm/roads",
    tag = "osm",
    responses(
        (status = 200, description = "Roads with a highway classification", body = Vec<RoadFeature>),
        (status = 503, description = "Feature store unavailable", body = ErrorResponse)
    )
)]
pub async fn get_roads(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_roads().await {
        Ok(roads) => (StatusCode::OK, Json(roads)).into_response(),
        Err(e) => error_response(GisError::Store(e)),
    }
}

/// List named polygons.
#[utoipa::path(
    get,
    path = "/api/v1/osm/polygons",
    tag = "osm",
    responses(
        (status = 200, description = "Named polygons", body = Vec<PolygonFeature>),
        (status = 503, description = "Feature store unavailable", body = ErrorResponse)
    )
)]
pub async fn get_polygons(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_polygons().await {
        Ok(polygons) => (StatusCode::OK, Json(polygons)).into_response(),
        Err(e) => error_response(GisError::Store(e)),
    }
}

/// Add a batch of points.
///
/// Every submission is handled independently. The response is `200 OK`
/// whenever the body is a JSON array, even if every item was rejected.
#[utoipa::path(
    post,
    path = "/api/v1/osm/points/add",
    tag = "osm",
    request_body = Vec<PointSubmission>,
    responses(
        (status = 200, description = "Batch processed", body = IngestResponse),
        (status = 400, description = "Body is not a JSON array of points", body = ErrorResponse)
    )
)]
pub async fn add_points(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<PointSubmission>>, JsonRejection>,
) -> Response {
    let Json(submissions) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    let result = state.ingestor.ingest(submissions).await;

    (
        StatusCode::OK,
        Json(IngestResponse {
            status: "ok".to_string(),
            inserted: result.accepted_count,
            rejected: result.rejected,
        }),
    )
        .into_response()
}

/// Compute the geodesic length of a path.
#[utoipa::path(
    post,
    path = "/api/v1/osm/distances",
    tag = "osm",
    request_body = DistanceRequest,
    responses(
        (status = 200, description = "Per-segment and total distance in meters", body = DistanceReport),
        (status = 400, description = "Malformed path", body = ErrorResponse),
        (status = 503, description = "Feature store unavailable", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn post_distances(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DistanceRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };

    match state.calculator.compute_path(&request.points).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is running", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Constraint { .. } => StatusCode::CONFLICT,
        StoreError::Query { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create an error response for a failed request.
fn error_response(e: GisError) -> Response {
    let status = match &e {
        GisError::MalformedPathInput { .. } => StatusCode::BAD_REQUEST,
        GisError::DistanceQueryFailure { source, .. } => store_status(source),
        GisError::Store(source) => store_status(source),
        GisError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %e, "Request failed");
    } else {
        tracing::warn!(error = %e, "Request rejected");
    }

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

/// Create an error response for a body that could not be decoded.
fn rejection_response(rejection: JsonRejection) -> Response {
    let status = match &rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        other => other.status(),
    };

    tracing::warn!(error = %rejection.body_text(), "Malformed request body");

    (
        status,
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
        .into_response()
}
