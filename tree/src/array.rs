//! # Expandable Array Utilities
//! Small growable/read-only array abstractions used to stage a block of
//! bulk-insert items without reallocating on every push, and to hand a
//! read-only view of that block to concurrent partitioning closures without
//! each of them needing their own clone.

use std::sync::Arc;

/// A growable staging buffer. Doubles its backing capacity instead of
/// growing one element at a time, the way `goko`'s builders stage a block
/// of indexes before splitting them across children.
#[derive(Debug, Clone)]
pub struct ExpandableArray<T> {
    items: Vec<T>,
}

impl<T> ExpandableArray<T> {
    pub fn with_capacity(capacity: usize) -> ExpandableArray<T> {
        ExpandableArray {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            self.items.reserve(self.items.capacity().max(1));
        }
        self.items.push(item);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self, block_size: usize) -> bool {
        self.items.len() >= block_size
    }

    /// Drains the buffer into an immutable, shareable view and resets this
    /// buffer to empty so it can be reused for the next block.
    pub fn take_readonly(&mut self) -> ReadonlyArray<T> {
        let taken = std::mem::take(&mut self.items);
        ReadonlyArray::new(taken)
    }
}

/// An immutable, `Arc`-backed view over a finished block. Cloning is O(1),
/// so every child-bucket partitioning closure can hold one without copying
/// the underlying items.
#[derive(Debug, Clone)]
pub struct ReadonlyArray<T> {
    items: Arc<[T]>,
}

impl<T> ReadonlyArray<T> {
    pub fn new(items: Vec<T>) -> ReadonlyArray<T> {
        ReadonlyArray {
            items: items.into(),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
