//! Cumulative geodesic distance along a caller-supplied path.

use std::sync::Arc;

use crate::error::{GisError, Result, StoreError};
use crate::model::{Coordinate, DistanceReport, PathSegment};
use crate::store::FeatureStore;

/// Measures consecutive pairs of a path through the store's geography engine.
#[derive(Clone)]
pub struct DistanceChainCalculator {
    store: Arc<dyn FeatureStore>,
}

impl DistanceChainCalculator {
    /// Create a calculator delegating distances to `store`.
    pub fn new(store: Arc<dyn FeatureStore>) -> Self {
        Self { store }
    }

    /// Measure every segment of `points` and their total.
    ///
    /// Issues one store query per segment, in path order. Segment `i` always
    /// joins `points[i]` and `points[i + 1]`. Fewer than two points yield an
    /// empty report.
    ///
    /// # Errors
    ///
    /// - [`GisError::MalformedPathInput`] if any coordinate is invalid; no
    ///   query is issued in that case.
    /// - [`GisError::DistanceQueryFailure`] if the store fails on a segment.
    ///   No partial report is returned.
    pub async fn compute_path(&self, points: &[Coordinate]) -> Result<DistanceReport> {
        for (index, coord) in points.iter().enumerate() {
            coord
                .validate()
                .map_err(|reason| GisError::MalformedPathInput {
                    reason: format!("point {index}: {reason}"),
                })?;
        }

        let mut report = DistanceReport {
            lines: Vec::with_capacity(points.len().saturating_sub(1)),
            total_distance: 0.0,
        };

        for (index, pair) in points.windows(2).enumerate() {
            let (from, to) = (pair[0], pair[1]);
            let distance = self
                .store
                .distance_between(from, to)
                .await
                .and_then(|meters| {
                    if meters.is_finite() && meters >= 0.0 {
                        Ok(meters)
                    } else {
                        Err(StoreError::Query {
                            message: format!("store returned invalid distance {meters}"),
                        })
                    }
                })
                .map_err(|source| GisError::DistanceQueryFailure { index, source })?;

            report.total_distance += distance;
            report.lines.push(PathSegment { from, to, distance });
        }

        tracing::debug!(
            points = points.len(),
            segments = report.lines.len(),
            total_distance = report.total_distance,
            "Path distance computed"
        );

        Ok(report)
    }
}
