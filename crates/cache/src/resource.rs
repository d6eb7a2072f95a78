//! Capability a value needs to live in a [`SizedResourceCache`].
//!
//! [`SizedResourceCache`]: crate::SizedResourceCache

use std::sync::Arc;

use respool_common::units::SizeUnit;

/// A resource that knows its own footprint and can free what it holds.
///
/// `size` must stay stable for as long as the value is cached; the cache
/// records it once at insertion. `release` is called at most once, by the
/// eviction pass, after the last handle has been released.
pub trait SizedResource: Send + Sync {
    /// Unit the footprint is measured in.
    type Size: SizeUnit;

    /// Footprint counted against the cache's size limit.
    fn size(&self) -> Self::Size;

    /// Frees whatever the resource holds.
    fn release(&self);
}

impl<T> SizedResource for Arc<T>
where
    T: SizedResource + ?Sized,
{
    type Size = T::Size;

    fn size(&self) -> Self::Size {
        (**self).size()
    }

    fn release(&self) {
        (**self).release();
    }
}

impl<T> SizedResource for Box<T>
where
    T: SizedResource + ?Sized,
{
    type Size = T::Size;

    fn size(&self) -> Self::Size {
        (**self).size()
    }

    fn release(&self) {
        (**self).release();
    }
}
