//! A sorted run of postings for one term.

use crate::index::{DocumentId, TermTracker, tracker_equal, tracker_less};
use crate::util::SortedVec;

/// An ordered, deduplicated collection of postings for a single term.
///
/// Postings stay sorted by `(doc_id, position)` at all times, so a segment
/// can be streamed straight into the merge-join query executor or onto disk.
pub struct Segment {
    postings: SortedVec<TermTracker>,
}

impl Segment {
    /// Create an empty segment.
    pub fn new() -> Self {
        Segment {
            postings: SortedVec::new(tracker_less, tracker_equal),
        }
    }

    /// Build a segment from postings already in ascending order.
    pub fn from_sorted(postings: Vec<TermTracker>) -> Self {
        let mut segment = Segment::new();
        for posting in postings {
            segment.add(posting);
        }
        segment
    }

    /// Insert a posting at its sorted position.
    ///
    /// Returns `false` when an identical posting is already present.
    pub fn add(&mut self, posting: TermTracker) -> bool {
        self.postings.insert(posting)
    }

    /// Remove every posting belonging to `doc_id`. Returns whether anything
    /// changed.
    pub fn remove_document(&mut self, doc_id: DocumentId) -> bool {
        self.postings.remove_if(|posting| posting.doc_id == doc_id)
    }

    /// Number of postings in the segment.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Whether the segment holds no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Smallest document id present, if any.
    pub fn lowest_doc_id(&self) -> Option<DocumentId> {
        self.postings.first().map(|posting| posting.doc_id)
    }

    /// Largest document id present, if any.
    pub fn highest_doc_id(&self) -> Option<DocumentId> {
        self.postings.last().map(|posting| posting.doc_id)
    }

    /// Iterate over the postings in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, TermTracker> {
        self.postings.iter()
    }

    /// Snapshot the postings as a plain vector, ascending.
    pub fn to_vec(&self) -> Vec<TermTracker> {
        self.postings.to_vec()
    }

    /// Split off the upper half of the postings, leaving the lower half in
    /// place. Used when a chunk outgrows its size bound.
    pub fn split_off_upper_half(&mut self) -> Vec<TermTracker> {
        self.postings.split_off_upper_half()
    }
}

impl Default for Segment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.len())
            .field("lowest_doc_id", &self.lowest_doc_id())
            .field("highest_doc_id", &self.highest_doc_id())
            .finish()
    }
}
