//! Point-in-time size accounting for a resource cache.

use respool_common::units::SizeUnit;
use serde::Serialize;

/// Snapshot of a cache's counters, taken under one lock acquisition.
///
/// Unlike reading the accessors one by one, every field here describes the
/// same moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats<S> {
    /// Number of entries in the mapping, pinned or evictable.
    pub entry_count: usize,

    /// Entries currently referenced by at least one handle.
    pub pinned_count: usize,

    /// Sum of the sizes of all entries.
    pub total_size: S,

    /// Sum of the sizes of entries no handle references.
    pub evictable_size: S,

    /// The configured size limit.
    pub size_limit: S,
}

impl<S: SizeUnit> CacheStats<S> {
    /// Amount by which `total_size` exceeds the limit, zero otherwise.
    pub fn overcommitted_size(&self) -> S {
        self.total_size.saturating_sub(self.size_limit)
    }

    /// Sum of the sizes of pinned entries.
    pub fn pinned_size(&self) -> S {
        self.total_size.saturating_sub(self.evictable_size)
    }

    /// `true` when pinned entries hold the cache above its limit.
    pub fn is_overcommitted(&self) -> bool {
        self.total_size > self.size_limit
    }

    /// Number of entries waiting in the eviction queue.
    pub fn evictable_count(&self) -> usize {
        self.entry_count.saturating_sub(self.pinned_count)
    }
}
