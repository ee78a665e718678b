//! Capacity-bounded collection of the best-scoring results.

use crate::search::SearchResult;
use crate::util::Heap;

/// Keeps the least relevant collected result at the top so it can be dropped
/// as soon as something better arrives.
fn less_relevant(a: &SearchResult, b: &SearchResult) -> bool {
    a.score < b.score || (a.score == b.score && a.doc_id > b.doc_id)
}

/// Collects at most `max_size` results, keeping the highest-scoring ones.
///
/// Backed by a min-heap over relevance: once the set is full, every new
/// result displaces the current worst or is discarded itself.
pub struct BoundedResultSet {
    storage: Heap<SearchResult>,
    max_size: usize,
}

impl BoundedResultSet {
    /// Create a collector keeping the best `max_size` results.
    pub fn new(max_size: usize) -> Self {
        BoundedResultSet {
            storage: Heap::new(less_relevant),
            max_size,
        }
    }

    /// Offer a result; the least relevant one is dropped when over capacity.
    pub fn store_new_result(&mut self, result: SearchResult) {
        self.storage.push(result);
        if self.storage.len() > self.max_size {
            self.storage.pop();
        }
    }

    /// Number of results currently held.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no results were collected.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Consume the set and return the results, most relevant first.
    pub fn into_sorted_vec(mut self) -> Vec<SearchResult> {
        let mut results = Vec::with_capacity(self.storage.len());
        while let Some(result) = self.storage.pop() {
            results.push(result);
        }
        results.reverse();
        results
    }
}

impl std::fmt::Debug for BoundedResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedResultSet")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(doc_id: u64, score: f64) -> SearchResult {
        SearchResult { doc_id, score }
    }

    #[test]
    fn test_results_come_out_most_relevant_first() {
        let mut set = BoundedResultSet::new(10);
        set.store_new_result(result(1, 2.0));
        set.store_new_result(result(2, 5.0));
        set.store_new_result(result(3, 1.0));

        let sorted = set.into_sorted_vec();
        assert_eq!(
            sorted,
            vec![result(2, 5.0), result(1, 2.0), result(3, 1.0)]
        );
    }

    #[test]
    fn test_capacity_drops_the_worst() {
        let mut set = BoundedResultSet::new(2);
        set.store_new_result(result(1, 1.0));
        set.store_new_result(result(2, 3.0));
        set.store_new_result(result(3, 2.0));
        assert_eq!(set.len(), 2);

        let sorted = set.into_sorted_vec();
        assert_eq!(sorted, vec![result(2, 3.0), result(3, 2.0)]);
    }

    #[test]
    fn test_equal_scores_rank_lower_doc_ids_first() {
        let mut set = BoundedResultSet::new(3);
        set.store_new_result(result(9, 1.0));
        set.store_new_result(result(3, 1.0));
        set.store_new_result(result(6, 1.0));

        let sorted = set.into_sorted_vec();
        let documents: Vec<_> = sorted.iter().map(|r| r.doc_id).collect();
        assert_eq!(documents, vec![3, 6, 9]);
    }

    #[test]
    fn test_empty_set() {
        let set = BoundedResultSet::new(5);
        assert!(set.is_empty());
        assert!(set.into_sorted_vec().is_empty());
    }
}
