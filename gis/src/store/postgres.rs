//! PostGIS-backed [`FeatureStore`] over an osm2pgsql schema.
//!
//! Expects the `planet_osm_point`, `planet_osm_roads` and `planet_osm_polygon`
//! tables with geometry in `way` (EPSG:3857) and an hstore `tags` column.
//! Synthetic identifiers come from the `gis_synthetic_osm_id` sequence,
//! created on first connect, so concurrent writers never share one.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::FeatureStore;
use crate::config::StoreConfig;
use crate::error::{GisError, Result, StoreError};
use crate::ids::{IdSource, SyntheticId};
use crate::model::{Coordinate, PersistedPoint, PointFeature, PolygonFeature, RoadFeature};

const INSERT_POINT: &str = "
    INSERT INTO planet_osm_point(osm_id, name, way)
    VALUES ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 3857))";

const GEODESIC_DISTANCE: &str = "
    SELECT ST_Distance(
        ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
        ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography)";

const CREATE_ID_SEQUENCE: &str = "
    CREATE SEQUENCE IF NOT EXISTS gis_synthetic_osm_id AS bigint MINVALUE 1 NO CYCLE";

// never moves the sequence backwards; (MIN(osm_id) = -n) => next is n + 1
const SEED_ID_SEQUENCE: &str = "
    SELECT setval('gis_synthetic_osm_id',
                  GREATEST(-(SELECT MIN(osm_id) FROM planet_osm_point),
                           (SELECT last_value FROM gis_synthetic_osm_id),
                           1))";

const NEXT_SYNTHETIC_ID: &str = "SELECT -nextval('gis_synthetic_osm_id')";

const SELECT_POINTS: &str = "
    SELECT name,
           osm_id,
           ST_AsGeoJSON(ST_Transform(way, 4326)) AS geojson
    FROM planet_osm_point
    WHERE name IS NOT NULL";

const DELETE_POINT: &str = "DELETE FROM planet_osm_point WHERE osm_id = $1";

const SELECT_ROADS: &str = "
    SELECT osm_id,
           name,
           highway,
           ST_AsGeoJSON(ST_Transform(way, 4326)) AS geojson
    FROM planet_osm_roads
    WHERE highway IS NOT NULL";

const SELECT_POLYGONS: &str = "
    SELECT osm_id,
           name,
           tags->'leisure' AS leisure_type,
           tags->'landuse' AS landuse_type,
           ST_AsGeoJSON(ST_Transform(way, 4326)) AS geojson
    FROM planet_osm_polygon
    WHERE name IS NOT NULL";

/// A [`FeatureStore`] backed by a `sqlx` PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgFeatureStore {
    pool: PgPool,
}

impl PgFeatureStore {
    /// Connect a pool using the URL and limits from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GisError::Config`] if no database URL is configured, or a
    /// store error if the first connection cannot be established.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let url = config
            .database_url()
            .ok_or_else(|| GisError::Config("database URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect(url)
            .await
            .map_err(StoreError::from)?;

        sqlx::query(CREATE_ID_SEQUENCE)
            .execute(&pool)
            .await
            .map_err(StoreError::from)?;
        let seeded: i64 = sqlx::query_scalar(SEED_ID_SEQUENCE)
            .fetch_one(&pool)
            .await
            .map_err(StoreError::from)?;

        tracing::info!(
            max_connections = config.max_connections(),
            next_synthetic_id = -(seeded.saturating_add(1)),
            "Connected to PostGIS feature store"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl IdSource for PgFeatureStore {
    async fn next_id(&self) -> std::result::Result<Option<SyntheticId>, StoreError> {
        let id: i64 = sqlx::query_scalar(NEXT_SYNTHETIC_ID)
            .fetch_one(&self.pool)
            .await?;
        Ok(SyntheticId::new(id))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let message = err.to_string();
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_foreign_key_violation()
                    || db.is_check_violation() =>
            {
                StoreError::Constraint { message }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connection { message },
            _ => StoreError::Query { message },
        }
    }
}

#[async_trait]
impl FeatureStore for PgFeatureStore {
    async fn insert_point(&self, point: &PersistedPoint) -> std::result::Result<(), StoreError> {
        sqlx::query(INSERT_POINT)
            .bind(point.osm_id.get())
            .bind(point.name.as_deref())
            .bind(point.location.x)
            .bind(point.location.y)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn distance_between(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> std::result::Result<f64, StoreError> {
        let meters: Option<f64> = sqlx::query_scalar(GEODESIC_DISTANCE)
            .bind(from.lon)
            .bind(from.lat)
            .bind(to.lon)
            .bind(to.lat)
            .fetch_one(&self.pool)
            .await?;
        meters.ok_or_else(|| StoreError::Query {
            message: "ST_Distance returned NULL".to_string(),
        })
    }

    async fn list_points(&self) -> std::result::Result<Vec<PointFeature>, StoreError> {
        let rows: Vec<(Option<String>, i64, Option<String>)> = sqlx::query_as(SELECT_POINTS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(name, osm_id, geojson)| PointFeature {
                name,
                osm_id,
                geojson,
            })
            .collect())
    }

    async fn delete_point(&self, osm_id: i64) -> std::result::Result<bool, StoreError> {
        let result = sqlx::query(DELETE_POINT)
            .bind(osm_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_roads(&self) -> std::result::Result<Vec<RoadFeature>, StoreError> {
        let rows: Vec<(i64, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as(SELECT_ROADS).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(osm_id, name, highway, geojson)| RoadFeature {
                osm_id,
                name,
                highway,
                geojson,
            })
            .collect())
    }

    async fn list_polygons(&self) -> std::result::Result<Vec<PolygonFeature>, StoreError> {
        let rows: Vec<(
            i64,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )> = sqlx::query_as(SELECT_POLYGONS).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(
                |(osm_id, name, leisure_type, landuse_type, geojson)| PolygonFeature {
                    osm_id,
                    name,
                    leisure_type,
                    landuse_type,
                    geojson,
                },
            )
            .collect())
    }
}
