//! A binary heap parameterized by an ordering predicate.
//!
//! Unlike `std::collections::BinaryHeap` this heap takes an explicit
//! strict less-than predicate instead of requiring `Ord`, so the same
//! element type can be heaped by different criteria (score, document id,
//! ...). With a less-than predicate the root is the smallest element.
//!
//! The heap is not thread-safe; concurrent use requires external locking.

/// An array-backed binary heap ordered by a strict less-than predicate.
pub struct Heap<T> {
    less: fn(&T, &T) -> bool,
    storage: Vec<T>,
}

impl<T> Heap<T> {
    /// Create an empty heap with the given ordering predicate.
    pub fn new(less: fn(&T, &T) -> bool) -> Self {
        Heap {
            less,
            storage: Vec::new(),
        }
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Push a value onto the heap.
    pub fn push(&mut self, value: T) {
        self.storage.push(value);
        self.sift_up();
    }

    /// Look at the root without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.storage.first()
    }

    /// Remove and return the root.
    pub fn pop(&mut self) -> Option<T> {
        if self.storage.is_empty() {
            return None;
        }
        let last = self.storage.len() - 1;
        self.storage.swap(0, last);
        let popped = self.storage.pop();
        self.sift_down(0);
        popped
    }

    fn sift_up(&mut self) {
        let mut current = self.storage.len() - 1;
        while current > 0 {
            let parent = (current - 1) / 2;
            if (self.less)(&self.storage[current], &self.storage[parent]) {
                self.storage.swap(current, parent);
                current = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut current: usize) {
        let len = self.storage.len();
        loop {
            let left = current * 2 + 1;
            if left >= len {
                return;
            }
            let right = current * 2 + 2;

            let mut swap_with = left;
            if right < len && (self.less)(&self.storage[right], &self.storage[left]) {
                swap_with = right;
            }

            if (self.less)(&self.storage[swap_with], &self.storage[current]) {
                self.storage.swap(swap_with, current);
                current = swap_with;
            } else {
                return;
            }
        }
    }
}

impl<T> std::fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap").field("len", &self.len()).finish()
    }
}
