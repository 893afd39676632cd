//! Batch ingestion of user-submitted points.
//!
//! [`BatchIngestor::ingest`] walks a batch in input order and settles every
//! submission independently: validate, project to EPSG:3857, draw a
//! [`SyntheticId`](crate::ids::SyntheticId), insert. A submission that fails any step becomes a
//! [`Rejection`] in the [`BatchResult`] and the loop moves on. Nothing is
//! rolled back; each insert is its own unit of work.

use std::sync::Arc;

use serde::Serialize;

use crate::ids::IdSource;
use crate::model::{PersistedPoint, PointSubmission};
use crate::projection::to_web_mercator;
use crate::store::FeatureStore;

/// Why a submission was not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason")]
pub enum RejectReason {
    /// `lat` or `lng` was absent, `null` or not a number.
    MissingCoordinate,
    /// The coordinate has no EPSG:3857 image (a pole).
    CoordinateOutOfRange { lat: f64, lng: f64 },
    /// The negative identifier range is used up.
    IdentifierSpaceExhausted,
    /// The store refused or failed the insert.
    PersistenceFailure { message: String },
}

/// A submission that was skipped, with its position in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Zero-based index in the submitted batch.
    pub index: usize,
    /// The submission as received.
    pub submission: PointSubmission,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: RejectReason,
}

/// What happened to a single submission.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Persisted under a new synthetic identifier.
    Accepted(PersistedPoint),
    /// Skipped.
    Rejected(RejectReason),
}

/// Consolidated result of one [`BatchIngestor::ingest`] call.
///
/// `accepted_count + rejected.len()` always equals the batch length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    /// Number of submissions persisted.
    pub accepted_count: usize,
    /// The persisted points, in input order.
    pub accepted: Vec<PersistedPoint>,
    /// The skipped submissions, in input order.
    pub rejected: Vec<Rejection>,
}

/// Validates, identifies and persists batches of [`PointSubmission`]s.
#[derive(Clone)]
pub struct BatchIngestor {
    store: Arc<dyn FeatureStore>,
    ids: Arc<dyn IdSource>,
}

impl BatchIngestor {
    /// Create an ingestor writing to `store` with identifiers from `ids`.
    ///
    /// Every ingestor writing to one store must share the same source.
    pub fn new(store: Arc<dyn FeatureStore>, ids: Arc<dyn IdSource>) -> Self {
        Self { store, ids }
    }

    /// Ingest a batch in input order, never stopping early.
    pub async fn ingest(&self, submissions: Vec<PointSubmission>) -> BatchResult {
        let total = submissions.len();
        let mut result = BatchResult::default();

        for (index, submission) in submissions.into_iter().enumerate() {
            match self.ingest_one(&submission).await {
                IngestOutcome::Accepted(point) => {
                    tracing::debug!(index, osm_id = %point.osm_id, "Point inserted");
                    result.accepted.push(point);
                }
                IngestOutcome::Rejected(reason) => {
                    tracing::warn!(index, ?submission, ?reason, "Point skipped");
                    result.rejected.push(Rejection {
                        index,
                        submission,
                        reason,
                    });
                }
            }
        }

        result.accepted_count = result.accepted.len();
        tracing::info!(
            total,
            inserted = result.accepted_count,
            rejected = result.rejected.len(),
            "Point batch ingested"
        );
        result
    }

    /// Settle a single submission.
    pub async fn ingest_one(&self, submission: &PointSubmission) -> IngestOutcome {
        let Some(coord) = submission.coordinate() else {
            return IngestOutcome::Rejected(RejectReason::MissingCoordinate);
        };
        let Ok(location) = to_web_mercator(coord) else {
            return IngestOutcome::Rejected(RejectReason::CoordinateOutOfRange {
                lat: coord.lat,
                lng: coord.lon,
            });
        };

        let osm_id = match self.ids.next_id().await {
            Ok(Some(osm_id)) => osm_id,
            Ok(None) => return IngestOutcome::Rejected(RejectReason::IdentifierSpaceExhausted),
            Err(e) => {
                return IngestOutcome::Rejected(RejectReason::PersistenceFailure {
                    message: e.to_string(),
                })
            }
        };

        let point = PersistedPoint {
            osm_id,
            name: submission.name.clone(),
            location,
        };

        match self.store.insert_point(&point).await {
            Ok(()) => IngestOutcome::Accepted(point),
            Err(e) => IngestOutcome::Rejected(RejectReason::PersistenceFailure {
                message: e.to_string(),
            }),
        }
    }
}
