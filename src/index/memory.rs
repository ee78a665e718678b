//! A purely in-memory reverse index.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::concurrent::ConcurrentMap;
use crate::error::Result;
use crate::index::{DocumentId, ReverseIndex, SyncSegment, TermTracker, Token};

/// A [`ReverseIndex`] that keeps every posting list in memory.
///
/// Useful for tests and for corpora small enough that persistence is not
/// worth the I/O. Document ids start at 1; 0 stays reserved as "unset".
pub struct MemoryIndex {
    segments: ConcurrentMap<String, Arc<SyncSegment>>,
    next_document_id: AtomicU64,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        MemoryIndex {
            segments: ConcurrentMap::new(),
            next_document_id: AtomicU64::new(1),
        }
    }

    /// Number of distinct terms indexed so far.
    pub fn term_count(&self) -> usize {
        self.segments.len()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ReverseIndex for MemoryIndex {
    fn iterate_over_terms(&self, term: &str) -> Box<dyn Iterator<Item = TermTracker> + Send> {
        match self.segments.get(&term.to_string()) {
            Some(segment) => Box::new(segment.to_vec().into_iter()),
            None => Box::new(std::iter::empty()),
        }
    }

    fn store_new_document(&self, tokens: &mut dyn Iterator<Item = Token>) -> Result<DocumentId> {
        let doc_id = self.next_document_id.fetch_add(1, Ordering::AcqRel);

        for token in tokens {
            let segment = self
                .segments
                .get_or_insert_with(token.stemmed_text, || Arc::new(SyncSegment::new()));
            segment.add(TermTracker::new(doc_id, token.position));
        }

        Ok(doc_id)
    }
}

impl std::fmt::Debug for MemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("terms", &self.term_count())
            .finish()
    }
}
