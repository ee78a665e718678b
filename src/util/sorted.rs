//! A vector kept sorted by a user-supplied ordering predicate.
//!
//! Ordering and equality are separate predicates so callers can distinguish
//! "equal for ordering purposes" from "identical": `insert` refuses exact
//! duplicates (per the equality predicate) while the ordering predicate
//! alone drives the binary search.

/// A sorted vector with predicate-based ordering and deduplication.
pub struct SortedVec<T> {
    less: fn(&T, &T) -> bool,
    equal: fn(&T, &T) -> bool,
    storage: Vec<T>,
}

impl<T> SortedVec<T> {
    /// Create an empty sorted vector with the given predicates.
    pub fn new(less: fn(&T, &T) -> bool, equal: fn(&T, &T) -> bool) -> Self {
        SortedVec {
            less,
            equal,
            storage: Vec::new(),
        }
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The smallest element, if any.
    pub fn first(&self) -> Option<&T> {
        self.storage.first()
    }

    /// The largest element, if any.
    pub fn last(&self) -> Option<&T> {
        self.storage.last()
    }

    /// Binary search for a value. Returns `(index, found)`: when not found,
    /// `index` is the insertion point that keeps the vector sorted.
    fn find_index(&self, value: &T) -> (usize, bool) {
        let mut low = 0usize;
        let mut high = self.storage.len();

        while low < high {
            let pivot = (low + high) / 2;
            let pivot_value = &self.storage[pivot];
            if (self.equal)(pivot_value, value) {
                return (pivot, true);
            }
            if (self.less)(pivot_value, value) {
                low = pivot + 1;
            } else {
                high = pivot;
            }
        }

        (low, false)
    }

    /// Insert a value at its sorted position.
    ///
    /// Returns `false` without modifying anything when an equal element is
    /// already present. Appends without searching when the value sorts after
    /// the current maximum, which is the common case for monotonic inputs.
    pub fn insert(&mut self, value: T) -> bool {
        if let Some(highest) = self.last() {
            if (self.equal)(highest, &value) {
                return false;
            }
            if (self.less)(highest, &value) {
                self.storage.push(value);
                return true;
            }
        }

        let (index, found) = self.find_index(&value);
        if found {
            return false;
        }
        self.storage.insert(index, value);
        true
    }

    /// Remove the element equal to `value`. Returns whether anything changed.
    pub fn remove(&mut self, value: &T) -> bool {
        let (index, found) = self.find_index(value);
        if found {
            self.storage.remove(index);
        }
        found
    }

    /// Remove every element matching the predicate. Returns whether anything
    /// changed.
    pub fn remove_if(&mut self, predicate: impl Fn(&T) -> bool) -> bool {
        let before = self.storage.len();
        self.storage.retain(|value| !predicate(value));
        self.storage.len() != before
    }

    /// Whether an equal element is present.
    pub fn contains(&self, value: &T) -> bool {
        self.find_index(value).1
    }

    /// Iterate over the elements in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.storage.iter()
    }

    /// Split off the upper half (by count) of the elements, leaving the lower
    /// half in place. The returned vector is in ascending order.
    pub fn split_off_upper_half(&mut self) -> Vec<T> {
        let middle = self.storage.len() / 2;
        self.storage.split_off(middle)
    }
}

impl<T: Clone> SortedVec<T> {
    /// Snapshot the contents as a plain vector, ascending.
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.clone()
    }
}

impl<T> std::fmt::Debug for SortedVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedVec")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn less(a: &(u64, u64), b: &(u64, u64)) -> bool {
        a < b
    }

    fn equal(a: &(u64, u64), b: &(u64, u64)) -> bool {
        a == b
    }

    fn new_vec() -> SortedVec<(u64, u64)> {
        SortedVec::new(less, equal)
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut vec = new_vec();
        for pair in [(3, 0), (1, 5), (2, 2), (1, 1), (3, 1)] {
            assert!(vec.insert(pair));
        }

        let collected: Vec<_> = vec.iter().copied().collect();
        assert_eq!(collected, vec![(1, 1), (1, 5), (2, 2), (3, 0), (3, 1)]);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut vec = new_vec();
        assert!(vec.insert((1, 1)));
        assert!(!vec.insert((1, 1)));
        assert_eq!(vec.len(), 1);
    }

    #[test]
    fn test_append_fast_path() {
        let mut vec = new_vec();
        for i in 0..100 {
            assert!(vec.insert((i, 0)));
        }
        assert_eq!(vec.len(), 100);
        assert_eq!(vec.first(), Some(&(0, 0)));
        assert_eq!(vec.last(), Some(&(99, 0)));
    }

    #[test]
    fn test_remove() {
        let mut vec = new_vec();
        vec.insert((1, 1));
        vec.insert((2, 2));
        vec.insert((3, 3));

        assert!(vec.remove(&(2, 2)));
        assert!(!vec.remove(&(2, 2)));
        assert!(!vec.contains(&(2, 2)));
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn test_remove_if() {
        let mut vec = new_vec();
        for i in 0..10 {
            vec.insert((i, i));
        }

        assert!(vec.remove_if(|&(doc, _)| doc % 2 == 0));
        assert_eq!(vec.len(), 5);
        assert!(!vec.remove_if(|&(doc, _)| doc > 100));

        let collected: Vec<_> = vec.iter().copied().collect();
        assert_eq!(collected, vec![(1, 1), (3, 3), (5, 5), (7, 7), (9, 9)]);
    }

    #[test]
    fn test_invariant_after_mixed_operations() {
        let mut vec = new_vec();
        for i in [5u64, 3, 9, 1, 7, 3, 5] {
            vec.insert((i, i));
        }
        vec.remove(&(9, 9));
        vec.insert((4, 4));
        vec.remove_if(|&(doc, _)| doc == 1);

        let collected: Vec<_> = vec.iter().copied().collect();
        let mut sorted = collected.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(collected, sorted);
    }

    #[test]
    fn test_split_off_upper_half() {
        let mut vec = new_vec();
        for i in 0..7 {
            vec.insert((i, 0));
        }

        let upper = vec.split_off_upper_half();
        assert_eq!(vec.len(), 3);
        assert_eq!(upper.len(), 4);
        assert_eq!(vec.last(), Some(&(2, 0)));
        assert_eq!(upper[0], (3, 0));
    }
}
