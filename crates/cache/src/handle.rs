//! Caller-side reference to a cached resource.

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;

use crate::resource::SizedResource;
use crate::sized::Shared;

/// One outstanding reference to a cached value.
///
/// The entry stays pinned for as long as the handle is alive. Dropping the
/// handle, calling [`ResourceHandle::release`] or passing it to
/// [`SizedResourceCache::release`](crate::SizedResourceCache::release) all
/// release it exactly once; the handle is consumed in each case so it cannot
/// be used or released again.
#[must_use = "dropping a handle releases the resource immediately"]
pub struct ResourceHandle<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    shared: Arc<Shared<K, V>>,
    key: K,
    entry_id: u64,
    value: Arc<V>,
}

impl<K, V> ResourceHandle<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    pub(crate) fn new(shared: Arc<Shared<K, V>>, key: K, entry_id: u64, value: Arc<V>) -> Self {
        Self { shared, key, entry_id, value }
    }

    /// Key the handle was acquired for.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the reference to the cache, making the entry evictable once no
    /// other handle pins it.
    pub fn release(self) {
        drop(self);
    }

    #[cfg(test)]
    pub(crate) fn entry_id(&self) -> u64 {
        self.entry_id
    }

    pub(crate) fn cache_name(&self) -> &str {
        self.shared.name()
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared<K, V>>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }
}

impl<K, V> Deref for ResourceHandle<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<K, V> Drop for ResourceHandle<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    fn drop(&mut self) {
        self.shared.release(&self.key, self.entry_id);
    }
}

impl<K, V> fmt::Debug for ResourceHandle<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: SizedResource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("cache", &self.cache_name())
            .field("key", &self.key)
            .field("entry_id", &self.entry_id)
            .finish()
    }
}
