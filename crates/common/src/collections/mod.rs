//! Specialized data structures
//!
//! - **[`linked_slab`]**: doubly linked list in a slab with stable ids, used
//!   as an `O(1)` recency queue
//!
//! ## Usage
//!
//! ```rust
//! use respool_common::collections::LinkedSlab;
//!
//! let mut recency = LinkedSlab::new();
//! let older = recency.push_front("older");
//! recency.push_front("newer");
//!
//! // Oldest entry is the next victim.
//! assert_eq!(recency.back().map(|(id, _)| id), Some(older));
//! ```

pub mod linked_slab;

pub use linked_slab::{Iter, LinkedSlab, SlotId};
