//! In-process [`FeatureStore`] used by tests and the `memory` backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use geo::{Distance, Geodesic};
use geojson::{Geometry, Value as GeoJsonValue};

use super::FeatureStore;
use crate::error::StoreError;
use crate::ids::{IdSource, SyntheticId, SyntheticIdAllocator};
use crate::model::{Coordinate, PersistedPoint, PointFeature, PolygonFeature, RoadFeature};
use crate::projection::{from_web_mercator, MercatorPoint};

/// A row of the in-memory point layer.
#[derive(Debug, Clone)]
struct StoredPoint {
    name: Option<String>,
    location: MercatorPoint,
}

/// A [`FeatureStore`] holding the point layer in a `BTreeMap`.
///
/// Distances use Karney's geodesic algorithm on the WGS84 ellipsoid, which
/// is what PostGIS computes for `geography` inputs. Roads and polygons are
/// read-only and supplied at construction. As an [`IdSource`] it plays the
/// part of the database sequence, numbering below every pre-seeded row.
///
/// Failure injection:
/// - [`set_unavailable`](Self::set_unavailable) makes every call fail with
///   [`StoreError::Connection`].
/// - [`fail_distances_after`](Self::fail_distances_after) lets the first `n`
///   distance queries succeed and fails the rest.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: RwLock<BTreeMap<i64, StoredPoint>>,
    roads: Vec<RoadFeature>,
    polygons: Vec<PolygonFeature>,
    unavailable: AtomicBool,
    distance_budget: Option<usize>,
    distance_calls: AtomicUsize,
    sequence: SyntheticIdAllocator,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the point layer with an existing row.
    pub fn with_point(mut self, osm_id: i64, name: Option<&str>, location: MercatorPoint) -> Self {
        let lowest = match self.points.write() {
            Ok(mut points) => {
                points.insert(
                    osm_id,
                    StoredPoint {
                        name: name.map(str::to_string),
                        location,
                    },
                );
                points.keys().next().copied()
            }
            Err(_) => None,
        };
        self.sequence = SyntheticIdAllocator::below(lowest);
        self
    }

    /// Supply the road layer.
    pub fn with_roads(mut self, roads: Vec<RoadFeature>) -> Self {
        self.roads = roads;
        self
    }

    /// Supply the polygon layer.
    pub fn with_polygons(mut self, polygons: Vec<PolygonFeature>) -> Self {
        self.polygons = polygons;
        self
    }

    /// Let only the first `successes` distance queries succeed.
    pub fn fail_distances_after(mut self, successes: usize) -> Self {
        self.distance_budget = Some(successes);
        self
    }

    /// Simulate the database going away (or coming back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of rows in the point layer.
    pub fn point_count(&self) -> usize {
        self.points.read().map(|points| points.len()).unwrap_or(0)
    }

    /// Whether a row with `osm_id` exists.
    pub fn contains_point(&self, osm_id: i64) -> bool {
        self.points
            .read()
            .map(|points| points.contains_key(&osm_id))
            .unwrap_or(false)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                message: "memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Query {
        message: "memory store lock poisoned".to_string(),
    }
}

fn point_geojson(location: MercatorPoint) -> Result<String, StoreError> {
    let coord = from_web_mercator(location).map_err(|e| StoreError::Query {
        message: e.to_string(),
    })?;
    let geometry = Geometry::new(GeoJsonValue::Point(vec![coord.lon, coord.lat]));
    serde_json::to_string(&geometry).map_err(|e| StoreError::Query {
        message: e.to_string(),
    })
}

#[async_trait]
impl FeatureStore for MemoryStore {
    async fn insert_point(&self, point: &PersistedPoint) -> Result<(), StoreError> {
        self.check_available()?;
        let mut points = self.points.write().map_err(|_| poisoned())?;
        let osm_id = point.osm_id.get();
        if points.contains_key(&osm_id) {
            return Err(StoreError::Constraint {
                message: format!("duplicate key value: osm_id={osm_id} already exists"),
            });
        }
        points.insert(
            osm_id,
            StoredPoint {
                name: point.name.clone(),
                location: point.location,
            },
        );
        Ok(())
    }

    async fn distance_between(&self, from: Coordinate, to: Coordinate) -> Result<f64, StoreError> {
        self.check_available()?;
        let call = self.distance_calls.fetch_add(1, Ordering::SeqCst);
        if self.distance_budget.is_some_and(|budget| call >= budget) {
            return Err(StoreError::Connection {
                message: format!("distance query {call} refused"),
            });
        }
        Ok(Geodesic.distance(geo::Point::from(from), geo::Point::from(to)))
    }

    async fn list_points(&self) -> Result<Vec<PointFeature>, StoreError> {
        self.check_available()?;
        let points = self.points.read().map_err(|_| poisoned())?;
        points
            .iter()
            .filter(|(_, point)| point.name.is_some())
            .map(|(osm_id, point)| {
                Ok(PointFeature {
                    name: point.name.clone(),
                    osm_id: *osm_id,
                    geojson: Some(point_geojson(point.location)?),
                })
            })
            .collect()
    }

    async fn delete_point(&self, osm_id: i64) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut points = self.points.write().map_err(|_| poisoned())?;
        Ok(points.remove(&osm_id).is_some())
    }

    async fn list_roads(&self) -> Result<Vec<RoadFeature>, StoreError> {
        self.check_available()?;
        Ok(self
            .roads
            .iter()
            .filter(|road| road.highway.is_some())
            .cloned()
            .collect())
    }

    async fn list_polygons(&self) -> Result<Vec<PolygonFeature>, StoreError> {
        self.check_available()?;
        Ok(self
            .polygons
            .iter()
            .filter(|polygon| polygon.name.is_some())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdSource for MemoryStore {
    async fn next_id(&self) -> Result<Option<SyntheticId>, StoreError> {
        self.check_available()?;
        Ok(self.sequence.allocate())
    }
}
