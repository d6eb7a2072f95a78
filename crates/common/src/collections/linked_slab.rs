#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

//! A doubly linked list whose nodes live in a slab, addressed by stable ids.
//!
//! # Complexity
//! - `push_front`, `remove`, `back`, `pop_back`, `get`, `contains`: `O(1)`.
//! - `clear`: `O(n)` due to drops.
//!
//! # Identity
//! - `push_front` returns a [`SlotId`] that stays valid until that node is
//!   removed, no matter how many other nodes are inserted or removed.
//! - Freed slots are recycled, but each reuse bumps the slot generation, so
//!   an id kept past its node's removal never addresses the new occupant.
//!
//! # Thread Safety
//! - `LinkedSlab` is a plain data structure; wrap it in a lock to share it.

use std::fmt;
use std::iter::FusedIterator;

/// Stable handle to a node inside a [`LinkedSlab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    index: usize,
    generation: u64,
}

impl SlotId {
    /// Position of the slot in the backing storage.
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }

    /// How many times the slot had been reused when this id was issued.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Linked list backed by an indexable slab stored in a `Vec`.
///
/// The front holds the most recently pushed value and the back the oldest
/// one, which makes it a natural recency queue: push at the front, take
/// victims from the back, and unlink arbitrary members by id.
///
/// # Examples
///
/// ```
/// use respool_common::collections::LinkedSlab;
///
/// let mut list = LinkedSlab::new();
/// let a = list.push_front("a");
/// let _b = list.push_front("b");
/// let c = list.push_front("c");
///
/// assert_eq!(list.remove(c), Some("c"));
/// assert_eq!(list.pop_back().map(|(_, value)| value), Some("a"));
/// assert!(!list.contains(a));
/// assert_eq!(list.len(), 1);
/// ```
pub struct LinkedSlab<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for LinkedSlab<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinkedSlab<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new(), free_list: Vec::new(), head: None, tail: None, len: 0 }
    }

    /// Creates an empty list with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Returns the number of linked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no nodes are linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links `value` at the front and returns its id.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.allocate_slot(value);
        self.attach_front(id.index);
        self.len += 1;
        id
    }

    /// Unlinks the node addressed by `id` and returns its value.
    ///
    /// Returns `None` when `id` does not address a live node (already
    /// removed, or issued for an earlier occupant of the slot).
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        self.detach(id.index);
        self.len = self.len.saturating_sub(1);
        let node = self.slots[id.index].node.take()?;
        self.release_slot(id.index);
        Some(node.value)
    }

    /// Returns the oldest node without unlinking it.
    #[must_use]
    pub fn back(&self) -> Option<(SlotId, &T)> {
        let index = self.tail?;
        let slot = &self.slots[index];
        slot.node
            .as_ref()
            .map(|node| (SlotId { index, generation: slot.generation }, &node.value))
    }

    /// Returns the newest node without unlinking it.
    #[must_use]
    pub fn front(&self) -> Option<(SlotId, &T)> {
        let index = self.head?;
        let slot = &self.slots[index];
        slot.node
            .as_ref()
            .map(|node| (SlotId { index, generation: slot.generation }, &node.value))
    }

    /// Unlinks and returns the oldest node.
    pub fn pop_back(&mut self) -> Option<(SlotId, T)> {
        let (id, _) = self.back()?;
        self.remove(id).map(|value| (id, value))
    }

    /// Reads the value addressed by `id`.
    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .map(|node| &node.value)
    }

    /// Returns `true` when `id` addresses a live node.
    #[must_use]
    pub fn contains(&self, id: SlotId) -> bool {
        self.get(id).is_some()
    }

    /// Unlinks every node. Outstanding ids are invalidated.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].node.take().is_some() {
                self.release_slot(index);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Returns an iterator from the newest node to the oldest.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { list: self, current: self.head, remaining: self.len }
    }

    fn allocate_slot(&mut self, value: T) -> SlotId {
        let node = Node { value, prev: None, next: None };
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            SlotId { index, generation: slot.generation }
        } else {
            self.slots.push(Slot { generation: 0, node: Some(node) });
            SlotId { index: self.slots.len() - 1, generation: 0 }
        }
    }

    fn release_slot(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
    }

    fn detach(&mut self, index: usize) {
        let (prev, next) = match self.slots.get(index).and_then(|slot| slot.node.as_ref()) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_index) => {
                if let Some(prev_node) = self.node_mut(prev_index) {
                    prev_node.next = next;
                }
            }
            None => {
                self.head = next;
            }
        }

        match next {
            Some(next_index) => {
                if let Some(next_node) = self.node_mut(next_index) {
                    next_node.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }

        if let Some(node) = self.node_mut(index) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_front(&mut self, index: usize) {
        let head = self.head;
        if let Some(node) = self.node_mut(index) {
            node.prev = None;
            node.next = head;
        }

        if let Some(head_index) = head {
            if let Some(head_node) = self.node_mut(head_index) {
                head_node.prev = Some(index);
            }
        } else {
            self.tail = Some(index);
        }

        self.head = Some(index);
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(index).and_then(|slot| slot.node.as_mut())
    }
}

impl<T> fmt::Debug for LinkedSlab<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedSlab")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("free", &self.free_list.len())
            .finish()
    }
}

/// Iterator over list values from newest to oldest.
pub struct Iter<'a, T> {
    list: &'a LinkedSlab<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let slot = &self.list.slots[index];
        let node = slot.node.as_ref()?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((SlotId { index, generation: slot.generation }, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
