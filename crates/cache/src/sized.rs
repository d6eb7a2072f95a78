//! Size-bounded LRU cache with reference-counted pinning.
//!
//! Each entry is either *pinned* (`ref_count > 0`, not in the eviction queue)
//! or *evictable* (`ref_count == 0`, queued by release recency). The whole
//! state sits behind one `parking_lot::Mutex`, so refcount transitions and
//! structural changes are observed together.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use respool_common::collections::{LinkedSlab, SlotId};
use respool_common::units::{ByteSize, SizeUnit};
use tracing::{debug, instrument, warn};

use crate::config::{CacheConfig, DEFAULT_NAME};
use crate::handle::ResourceHandle;
use crate::invariant::{grow, shrink, violated};
use crate::resource::SizedResource;
use crate::stats::CacheStats;

/// Entry stored in the cache with its pinning bookkeeping
struct CacheEntry<V: SizedResource> {
    /// Distinguishes this entry from earlier entries for the same key.
    id: u64,
    value: Arc<V>,
    /// Size recorded at insertion; all accounting uses this figure.
    size: V::Size,
    ref_count: usize,
    /// Present exactly when `ref_count == 0`.
    eviction_position: Option<SlotId>,
}

/// Mapping, eviction queue and counters, guarded together.
struct CacheState<K, V: SizedResource> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Evictable keys; front is the most recently released.
    eviction: LinkedSlab<K>,
    total_size: V::Size,
    evictable_size: V::Size,
    next_entry_id: u64,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            eviction: LinkedSlab::new(),
            total_size: V::Size::ZERO,
            evictable_size: V::Size::ZERO,
            next_entry_id: 0,
        }
    }

    /// Takes one more reference to an existing entry, pulling it out of the
    /// eviction queue on the 0 -> 1 transition.
    fn pin(&mut self, cache: &str, key: &K) -> Option<(u64, Arc<V>)> {
        let entry = self.entries.get_mut(key)?;

        entry.ref_count = match entry.ref_count.checked_add(1) {
            Some(count) => count,
            None => violated(cache, format_args!("ref_count overflow for key {key:?}")),
        };

        if entry.ref_count == 1 {
            let Some(position) = entry.eviction_position.take() else {
                violated(cache, format_args!("unpinned entry {key:?} has no eviction position"))
            };
            match self.eviction.remove(position) {
                Some(queued) if queued == *key => {}
                other => violated(
                    cache,
                    format_args!("eviction slot {position} holds {other:?}, expected {key:?}"),
                ),
            }
            self.evictable_size = shrink(cache, "evictable_size", self.evictable_size, entry.size);
            debug!(key = ?key, size = ?entry.size, "re-pinned evictable resource");
        } else {
            debug!(key = ?key, ref_count = entry.ref_count, "reused pinned resource");
        }

        Some((entry.id, Arc::clone(&entry.value)))
    }

    /// Records a freshly created value as a pinned entry.
    fn insert(&mut self, cache: &str, key: K, value: V) -> (u64, Arc<V>) {
        let size = value.size();
        let id = self.next_entry_id;
        self.next_entry_id = self.next_entry_id.wrapping_add(1);
        self.total_size = grow(cache, "total_size", self.total_size, size);

        let value = Arc::new(value);
        let entry =
            CacheEntry { id, value: Arc::clone(&value), size, ref_count: 1, eviction_position: None };
        debug!(key = ?key, size = ?size, total_size = ?self.total_size, "created resource");
        if self.entries.insert(key.clone(), entry).is_some() {
            violated(cache, format_args!("created {key:?} while an entry was mapped"));
        }

        (id, value)
    }

    /// Drops one reference; on the 1 -> 0 transition the entry joins the
    /// most recently released end of the eviction queue.
    fn unpin(&mut self, cache: &str, key: &K, entry_id: u64) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            violated(cache, format_args!("released {key:?} which is not cached"))
        };
        if entry.id != entry_id {
            violated(
                cache,
                format_args!("released {key:?} entry {entry_id}, mapped entry is {}", entry.id),
            );
        }

        entry.ref_count = match entry.ref_count.checked_sub(1) {
            Some(count) => count,
            None => violated(cache, format_args!("released {key:?} with no outstanding handles")),
        };
        if entry.ref_count > 0 {
            return false;
        }

        if let Some(position) = entry.eviction_position {
            violated(cache, format_args!("pinned entry {key:?} already queued at {position}"));
        }
        entry.eviction_position = Some(self.eviction.push_front(key.clone()));
        self.evictable_size = grow(cache, "evictable_size", self.evictable_size, entry.size);
        debug!(key = ?key, size = ?entry.size, "resource became evictable");
        true
    }

    /// Evicts least recently released entries while over `limit`.
    ///
    /// Pinned entries are never touched, so the loop may stop with the cache
    /// still over its limit.
    fn evict(&mut self, cache: &str, limit: V::Size) -> usize {
        let mut evicted = 0;

        while self.total_size > limit {
            let Some((position, key)) = self.eviction.pop_back() else {
                break;
            };
            let Some(entry) = self.entries.remove(&key) else {
                violated(cache, format_args!("eviction queue holds unmapped key {key:?}"))
            };
            if entry.ref_count != 0 {
                violated(
                    cache,
                    format_args!("queued entry {key:?} has ref_count {}", entry.ref_count),
                );
            }
            if entry.eviction_position != Some(position) {
                violated(
                    cache,
                    format_args!(
                        "entry {key:?} records position {:?}, queue slot is {position}",
                        entry.eviction_position
                    ),
                );
            }

            self.total_size = shrink(cache, "total_size", self.total_size, entry.size);
            self.evictable_size = shrink(cache, "evictable_size", self.evictable_size, entry.size);
            debug!(
                key = ?key,
                size = ?entry.size,
                total_size = ?self.total_size,
                "evicted resource"
            );

            entry.value.release();
            evicted += 1;
        }

        evicted
    }

    fn stats(&self, limit: V::Size) -> CacheStats<V::Size> {
        CacheStats {
            entry_count: self.entries.len(),
            pinned_count: self.entries.len().saturating_sub(self.eviction.len()),
            total_size: self.total_size,
            evictable_size: self.evictable_size,
            size_limit: limit,
        }
    }
}

/// State shared between a cache, its clones and its handles.
pub(crate) struct Shared<K, V: SizedResource> {
    name: String,
    size_limit: V::Size,
    state: Mutex<CacheState<K, V>>,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(cache = %self.name))]
    pub(crate) fn release(&self, key: &K, entry_id: u64) {
        let mut state = self.state.lock();
        if state.unpin(&self.name, key, entry_id) {
            state.evict(&self.name, self.size_limit);
        }
    }
}

/// Thread-safe, size-bounded cache of reference-counted resources
///
/// Entries are created on demand by [`acquire`](Self::acquire) and stay
/// pinned while any [`ResourceHandle`] for them is alive. Released entries
/// are evicted least-recently-released first whenever the total size goes
/// over the limit. Cloning the cache shares the same state.
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone + Debug`)
/// - `V`: Value type implementing [`SizedResource`]
///
/// # Panics
/// Every operation panics if it detects corrupted bookkeeping, including a
/// handle from another cache being passed to [`release`](Self::release).
pub struct SizedResourceCache<K, V: SizedResource> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> SizedResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    /// Creates an empty cache that evicts released entries while its total
    /// size exceeds `size_limit`.
    pub fn new(size_limit: V::Size) -> Self {
        Self::with_name(DEFAULT_NAME, size_limit)
    }

    /// Creates an empty cache whose log events carry `name`.
    pub fn with_name(name: impl Into<String>, size_limit: V::Size) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                size_limit,
                state: Mutex::new(CacheState::new()),
            }),
        }
    }

    /// Creates an empty cache from a loaded [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Self
    where
        V::Size: From<ByteSize>,
    {
        Self::with_name(config.name.clone(), V::Size::from(config.size_limit))
    }

    /// Returns a handle to the value cached under `key`, creating it with
    /// `factory` on a miss
    ///
    /// The factory runs while the cache lock is held, so concurrent misses
    /// on one key create the value once. It must not call back into this
    /// cache. If it fails, its error is returned unchanged and the cache is
    /// left exactly as it was.
    #[instrument(skip_all, fields(cache = %self.shared.name))]
    pub fn acquire<F, E>(&self, key: K, factory: F) -> Result<ResourceHandle<K, V>, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let name = self.shared.name.as_str();
        let mut state = self.shared.state.lock();

        if let Some((entry_id, value)) = state.pin(name, &key) {
            return Ok(ResourceHandle::new(Arc::clone(&self.shared), key, entry_id, value));
        }

        let value = factory(&key)?;
        let (entry_id, value) = state.insert(name, key.clone(), value);
        state.evict(name, self.shared.size_limit);

        if state.total_size > self.shared.size_limit {
            warn!(
                key = ?key,
                total_size = ?state.total_size,
                size_limit = ?self.shared.size_limit,
                "pinned resources exceed the size limit"
            );
        }

        Ok(ResourceHandle::new(Arc::clone(&self.shared), key, entry_id, value))
    }

    /// Returns `handle` to the cache
    ///
    /// Equivalent to dropping it; provided so call sites can make the
    /// release explicit.
    ///
    /// # Panics
    /// Panics if `handle` was acquired from a different cache.
    pub fn release(&self, handle: ResourceHandle<K, V>) {
        if !handle.belongs_to(&self.shared) {
            violated(
                &self.shared.name,
                format_args!(
                    "handle for {:?} from cache '{}' released here",
                    handle.key(),
                    handle.cache_name()
                ),
            );
        }
        handle.release();
    }

    /// Number of entries, pinned or evictable.
    pub fn entry_count(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    /// Sum of the sizes of all entries.
    pub fn total_size(&self) -> V::Size {
        self.shared.state.lock().total_size
    }

    /// Sum of the sizes of entries no handle references.
    pub fn evictable_size(&self) -> V::Size {
        self.shared.state.lock().evictable_size
    }

    /// Amount by which pinned entries hold the cache above its limit.
    pub fn overcommitted_size(&self) -> V::Size {
        self.shared.state.lock().total_size.saturating_sub(self.shared.size_limit)
    }

    /// The configured size limit.
    pub fn size_limit(&self) -> V::Size {
        self.shared.size_limit
    }

    /// Name carried by this cache's log events.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// `true` when an entry for `key` is cached, pinned or not.
    pub fn contains(&self, key: &K) -> bool {
        self.shared.state.lock().entries.contains_key(key)
    }

    /// Snapshot of all counters taken under a single lock acquisition.
    pub fn stats(&self) -> CacheStats<V::Size> {
        self.shared.state.lock().stats(self.shared.size_limit)
    }
}

impl<K, V: SizedResource> Clone for SizedResourceCache<K, V> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<K, V> fmt::Debug for SizedResourceCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("SizedResourceCache")
            .field("name", &self.shared.name)
            .field("size_limit", &stats.size_limit)
            .field("entry_count", &stats.entry_count)
            .field("total_size", &stats.total_size)
            .field("evictable_size", &stats.evictable_size)
            .finish()
    }
}
