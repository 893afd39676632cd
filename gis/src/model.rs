//! Wire and domain types shared by the ingestion and distance pipelines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SyntheticId;
use crate::projection::MercatorPoint;

/// A geographic coordinate in WGS84 decimal degrees (EPSG:4326).
///
/// On the wire a coordinate is a GeoJSON-ordered position, `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude in decimal degrees (-180 to 180).
    pub lon: f64,
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
}

impl Coordinate {
    /// Create a new coordinate from longitude and latitude.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Check that the coordinate denotes a real place on the globe.
    ///
    /// # Errors
    ///
    /// Returns a short description of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if !self.lon.is_finite() || !self.lat.is_finite() {
            return Err("coordinate is not a finite number");
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err("latitude must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err("longitude must be within [-180, 180]");
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    fn try_from(position: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat] => Ok(Self::new(*lon, *lat)),
            other => Err(format!(
                "expected a [lon, lat] pair, got {} value(s)",
                other.len()
            )),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::Point::new(coord.lon, coord.lat)
    }
}

/// A caller-supplied point awaiting validation.
///
/// Any JSON value deserializes: a field that is missing or of the wrong type
/// becomes `None`, and a non-object element has no fields at all. One bad
/// item is then rejected on its own instead of failing the whole batch body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PointSubmission {
    /// Optional display name stored in the `name` column.
    pub name: Option<String>,
    /// Latitude in decimal degrees.
    pub lat: Option<f64>,
    /// Longitude in decimal degrees.
    pub lng: Option<f64>,
}

impl PointSubmission {
    /// Create a submission with both coordinates present.
    pub fn new(name: Option<String>, lat: f64, lng: f64) -> Self {
        Self {
            name,
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    /// The submission's location, if both coordinates are usable.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Coordinate::new(lng, lat))
            }
            _ => None,
        }
    }
}

impl From<Value> for PointSubmission {
    fn from(value: Value) -> Self {
        Self {
            name: value.get("name").and_then(Value::as_str).map(str::to_string),
            lat: value.get("lat").and_then(Value::as_f64),
            lng: value.get("lng").and_then(Value::as_f64),
        }
    }
}

/// A point written to the feature store by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PersistedPoint {
    /// Synthetic (negative) OSM identifier.
    #[cfg_attr(feature = "utoipa", schema(value_type = i64))]
    pub osm_id: SyntheticId,
    /// Optional display name.
    pub name: Option<String>,
    /// Location in the store's projected reference (EPSG:3857).
    pub location: MercatorPoint,
}

/// One consecutive pair of a path with its geodesic length.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PathSegment {
    /// Segment start.
    #[cfg_attr(feature = "utoipa", schema(value_type = Vec<f64>))]
    pub from: Coordinate,
    /// Segment end.
    #[cfg_attr(feature = "utoipa", schema(value_type = Vec<f64>))]
    pub to: Coordinate,
    /// Geodesic distance in meters.
    pub distance: f64,
}

/// Per-segment distances of a path plus their running total.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct DistanceReport {
    /// Segments in path order; segment `i` joins points `i` and `i + 1`.
    pub lines: Vec<PathSegment>,
    /// Sum of all segment distances in meters.
    #[serde(rename = "totalDistance")]
    pub total_distance: f64,
}

/// A named point from `planet_osm_point`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PointFeature {
    pub name: Option<String>,
    pub osm_id: i64,
    /// GeoJSON geometry text in EPSG:4326.
    pub geojson: Option<String>,
}

/// A road from `planet_osm_roads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct RoadFeature {
    pub osm_id: i64,
    pub name: Option<String>,
    pub highway: Option<String>,
    /// GeoJSON geometry text in EPSG:4326.
    pub geojson: Option<String>,
}

/// A named polygon from `planet_osm_polygon`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct PolygonFeature {
    pub osm_id: i64,
    pub name: Option<String>,
    /// Value of the `leisure` tag.
    pub leisure_type: Option<String>,
    /// Value of the `landuse` tag.
    pub landuse_type: Option<String>,
    /// GeoJSON geometry text in EPSG:4326.
    pub geojson: Option<String>,
}
