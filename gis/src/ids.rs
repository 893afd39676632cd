//! Synthetic OSM identifiers for user-submitted points.
//!
//! Imported OpenStreetMap data only ever uses non-negative identifiers, so
//! points added through the gateway are keyed by negative ones. A single
//! [`SyntheticIdAllocator`] hands out strictly decreasing values with an
//! atomic compare-and-swap, so concurrent batches in one process can never
//! observe the same identifier. Stores that several processes write to
//! implement [`IdSource`] over a store-side sequence instead.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::StoreError;

/// A negative identifier reserved for gateway-created points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SyntheticId(i64);

impl SyntheticId {
    /// Wrap `value` if it is strictly negative.
    pub fn new(value: i64) -> Option<Self> {
        (value < 0).then_some(Self(value))
    }

    /// The raw `osm_id` value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SyntheticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where ingestion draws synthetic identifiers from.
#[async_trait]
pub trait IdSource: Send + Sync {
    /// The next unused identifier, or `None` once the negative range is used up.
    async fn next_id(&self) -> Result<Option<SyntheticId>, StoreError>;
}

/// Lock-free, strictly decreasing source of [`SyntheticId`]s.
#[derive(Debug)]
pub struct SyntheticIdAllocator {
    /// The next identifier to hand out.
    next: AtomicI64,
}

impl SyntheticIdAllocator {
    /// Create an allocator whose first identifier is `-1`.
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(-1),
        }
    }

    /// Create an allocator that starts strictly below `lowest_existing`.
    ///
    /// Pass the smallest `osm_id` already present in the store so that a
    /// restarted process never re-issues an identifier from an earlier run.
    /// The first identifier is never above `-1`.
    pub fn below(lowest_existing: Option<i64>) -> Self {
        let start = match lowest_existing {
            // an existing i64::MIN leaves nothing to hand out
            Some(lowest) if lowest <= 0 => lowest.checked_sub(1).unwrap_or(0),
            _ => -1,
        };
        Self {
            next: AtomicI64::new(start),
        }
    }

    /// Allocate the next identifier.
    ///
    /// Returns `None` once the negative `i64` range is used up; the counter
    /// never wraps around to positive values.
    pub fn allocate(&self) -> Option<SyntheticId> {
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                // i64::MIN is handed out last; the sentinel 0 marks exhaustion
                if current == 0 {
                    None
                } else {
                    Some(current.checked_sub(1).unwrap_or(0))
                }
            })
            .ok()
            .and_then(SyntheticId::new)
    }

    /// The identifier the next call to [`allocate`](Self::allocate) would return.
    pub fn peek(&self) -> Option<SyntheticId> {
        SyntheticId::new(self.next.load(Ordering::Acquire))
    }
}

impl Default for SyntheticIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdSource for SyntheticIdAllocator {
    async fn next_id(&self) -> Result<Option<SyntheticId>, StoreError> {
        Ok(self.allocate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_synthetic_id_rejects_non_negative() {
        assert!(SyntheticId::new(0).is_none());
        assert!(SyntheticId::new(42).is_none());
        assert_eq!(SyntheticId::new(-7).map(SyntheticId::get), Some(-7));
    }

    #[test]
    fn test_allocate_decreasing() {
        let allocator = SyntheticIdAllocator::new();
        let ids: Vec<i64> = (0..3)
            .map(|_| allocator.allocate().unwrap().get())
            .collect();
        assert_eq!(ids, vec![-1, -2, -3]);
    }

    #[test]
    fn test_below_existing() {
        assert_eq!(SyntheticIdAllocator::below(None).peek().unwrap().get(), -1);
        assert_eq!(
            SyntheticIdAllocator::below(Some(1_000)).peek().unwrap().get(),
            -1
        );
        assert_eq!(
            SyntheticIdAllocator::below(Some(-1_700_000_000_000))
                .peek()
                .unwrap()
                .get(),
            -1_700_000_000_001
        );
    }

    #[test]
    fn test_exhaustion_never_wraps() {
        let allocator = SyntheticIdAllocator::below(Some(i64::MIN + 2));
        assert_eq!(allocator.allocate().unwrap().get(), i64::MIN + 1);
        assert_eq!(allocator.allocate().unwrap().get(), i64::MIN);
        assert!(allocator.allocate().is_none());
        assert!(allocator.allocate().is_none());

        assert!(SyntheticIdAllocator::below(Some(i64::MIN)).allocate().is_none());
    }

    #[test]
    fn test_concurrent_allocation_unique() {
        let allocator = Arc::new(SyntheticIdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || {
                    (0..1_000)
                        .map(|_| allocator.allocate().unwrap().get())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(id < 0);
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8_000);
    }

    #[tokio::test]
    async fn test_allocator_as_id_source() {
        let source: Arc<dyn IdSource> = Arc::new(SyntheticIdAllocator::below(Some(-10)));
        assert_eq!(source.next_id().await.unwrap().map(SyntheticId::get), Some(-11));
        assert_eq!(source.next_id().await.unwrap().map(SyntheticId::get), Some(-12));
    }
}
