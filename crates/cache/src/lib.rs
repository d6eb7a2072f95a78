//! Size-bounded, reference-counted LRU cache for expensive shared resources.
//!
//! A [`SizedResourceCache`] hands out [`ResourceHandle`]s. While any handle
//! for a key is alive the entry is *pinned* and never evicted. Once the last
//! handle is released the entry becomes *evictable* and is queued by release
//! recency; entries are evicted from the least recently released end, and
//! their [`SizedResource::release`] hook called, while the total size exceeds
//! the configured limit.
//!
//! Pinned entries may push the total over the limit. That excess is reported
//! by [`SizedResourceCache::overcommitted_size`] and is not an error.
//!
//! ```
//! use std::convert::Infallible;
//!
//! use respool_cache::{SizedResource, SizedResourceCache};
//! use respool_common::ByteSize;
//!
//! struct Blob(Vec<u8>);
//!
//! impl SizedResource for Blob {
//!     type Size = ByteSize;
//!
//!     fn size(&self) -> ByteSize {
//!         ByteSize::from_bytes(self.0.len() as u64)
//!     }
//!
//!     fn release(&self) {}
//! }
//!
//! let cache = SizedResourceCache::new(ByteSize::KIBIBYTE);
//! let handle = cache
//!     .acquire("greeting".to_string(), |_| Ok::<_, Infallible>(Blob(b"hello".to_vec())))
//!     .unwrap();
//! assert_eq!(handle.0, b"hello");
//! assert_eq!(cache.total_size(), ByteSize::from_bytes(5));
//!
//! cache.release(handle);
//! assert_eq!(cache.evictable_size(), ByteSize::from_bytes(5));
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod config;
mod handle;
mod invariant;
pub mod resource;
mod sized;
pub mod stats;

pub use config::{CacheConfig, CacheConfigBuilder, ConfigError};
pub use handle::ResourceHandle;
pub use resource::SizedResource;
pub use sized::SizedResourceCache;
pub use stats::CacheStats;
