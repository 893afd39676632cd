//! Web-Mercator (EPSG:3857) projection.
//!
//! The osm2pgsql tables store geometry in EPSG:3857 while callers speak
//! WGS84 degrees. Ingestion projects submitted points here before they reach
//! the store; reads rely on the store's `ST_Transform` for the reverse trip.
//!
//! EPSG:3857 treats WGS84 degrees as positions on a sphere with the WGS84
//! semi-major axis as radius, so both definitions below share that sphere
//! and no datum shift happens between them.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::Serialize;

use crate::error::ProjectionError;
use crate::model::Coordinate;

/// Latitude where the projection becomes square, `atan(sinh(π))` in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Half the width of the projected world, in meters.
pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

const GEOGRAPHIC: &str = "+proj=longlat +a=6378137 +b=6378137 +no_defs";

const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 \
                            +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

thread_local! {
    // (geographic, web mercator)
    static PROJECTIONS: Result<(Proj, Proj), ProjectionError> = build_projections();
}

fn build_projections() -> Result<(Proj, Proj), ProjectionError> {
    let geographic = Proj::from_proj_string(GEOGRAPHIC).map_err(ProjectionError::from_display)?;
    let mercator = Proj::from_proj_string(WEB_MERCATOR).map_err(ProjectionError::from_display)?;
    Ok((geographic, mercator))
}

/// A position in EPSG:3857 meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct MercatorPoint {
    /// Easting in meters.
    pub x: f64,
    /// Northing in meters.
    pub y: f64,
}

/// Whether `coord` can be represented in EPSG:3857 at all.
///
/// Latitudes beyond [`MAX_LATITUDE`] still project (outside the square
/// world) and longitudes outside ±180 wrap; only the poles and non-finite
/// values have no image.
pub fn is_projectable(coord: Coordinate) -> bool {
    coord.lon.is_finite() && coord.lat.is_finite() && coord.lat.abs() < 90.0
}

/// Project a WGS84 coordinate into EPSG:3857.
///
/// # Errors
///
/// Returns [`ProjectionError`] if the coordinate has no image, see
/// [`is_projectable`].
pub fn to_web_mercator(coord: Coordinate) -> Result<MercatorPoint, ProjectionError> {
    if !is_projectable(coord) {
        return Err(ProjectionError {
            message: format!("({}, {}) has no Web-Mercator image", coord.lon, coord.lat),
        });
    }

    let mut point = (coord.lon.to_radians(), coord.lat.to_radians(), 0.0);
    PROJECTIONS.with(|projections| {
        let (geographic, mercator) = projections.as_ref().map_err(Clone::clone)?;
        transform(geographic, mercator, &mut point).map_err(ProjectionError::from_display)
    })?;

    Ok(MercatorPoint {
        x: point.0,
        y: point.1,
    })
}

/// Inverse of [`to_web_mercator`].
///
/// # Errors
///
/// Returns [`ProjectionError`] if the point is not finite.
pub fn from_web_mercator(point: MercatorPoint) -> Result<Coordinate, ProjectionError> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return Err(ProjectionError {
            message: format!("({}, {}) is not a finite position", point.x, point.y),
        });
    }

    let mut position = (point.x, point.y, 0.0);
    PROJECTIONS.with(|projections| {
        let (geographic, mercator) = projections.as_ref().map_err(Clone::clone)?;
        transform(mercator, geographic, &mut position).map_err(ProjectionError::from_display)
    })?;

    Ok(Coordinate::new(
        position.0.to_degrees(),
        position.1.to_degrees(),
    ))
}
