//! Thread-safe wrapper around a [`Segment`].

use crate::concurrent::RwFairLock;
use crate::index::{DocumentId, Segment, TermTracker};

/// A [`Segment`] behind a writer-preferring lock.
///
/// Readers take snapshots; writers mutate in place. The writer preference
/// matters here because indexing threads append postings continuously while
/// query threads read, and appends must not starve.
pub struct SyncSegment {
    inner: RwFairLock<Segment>,
}

impl SyncSegment {
    /// Create an empty synchronized segment.
    pub fn new() -> Self {
        SyncSegment {
            inner: RwFairLock::new(Segment::new()),
        }
    }

    /// Wrap an existing segment.
    pub fn from_segment(segment: Segment) -> Self {
        SyncSegment {
            inner: RwFairLock::new(segment),
        }
    }

    /// Insert a posting. Returns `false` for an exact duplicate.
    pub fn add(&self, posting: TermTracker) -> bool {
        self.inner.write().add(posting)
    }

    /// Remove every posting of `doc_id`. Returns whether anything changed.
    pub fn remove_document(&self, doc_id: DocumentId) -> bool {
        self.inner.write().remove_document(doc_id)
    }

    /// Number of postings currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no postings are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Snapshot the postings in ascending order.
    pub fn to_vec(&self) -> Vec<TermTracker> {
        self.inner.read().to_vec()
    }
}

impl Default for SyncSegment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSegment")
            .field("len", &self.len())
            .finish()
    }
}
