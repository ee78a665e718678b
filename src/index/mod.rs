//! Core index data model: documents, postings, and the reverse-index trait.

pub mod inverted;
pub mod memory;
pub mod segment;
pub mod sync_segment;

use crate::error::Result;

pub use self::inverted::InvertedIndex;
pub use self::memory::MemoryIndex;
pub use self::segment::Segment;
pub use self::sync_segment::SyncSegment;

/// Opaque document identifier.
///
/// Assigned monotonically at store time and never reused. Zero is reserved
/// as "unset" and is never handed out.
pub type DocumentId = u64;

/// Zero-based ordinal of a token within its document.
pub type TermPosition = u64;

/// One stemmed token, as produced by the (external) tokenizer front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// The stemmed form used for indexing and matching.
    pub stemmed_text: String,
    /// The surface form as it appeared in the document.
    pub original_text: String,
    /// Position of the token within its document.
    pub position: TermPosition,
}

impl Token {
    /// Build a token whose stemmed and original forms coincide.
    pub fn new<S: Into<String>>(text: S, position: TermPosition) -> Self {
        let text = text.into();
        Token {
            stemmed_text: text.clone(),
            original_text: text,
            position,
        }
    }
}

/// One posting: an occurrence of a term at a position inside a document.
///
/// Postings order lexicographically by `(doc_id, position)`, which is the
/// order every posting iterator in the crate must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermTracker {
    /// Document the term occurred in.
    pub doc_id: DocumentId,
    /// Position of the occurrence within the document.
    pub position: TermPosition,
}

impl TermTracker {
    /// Build a posting.
    pub fn new(doc_id: DocumentId, position: TermPosition) -> Self {
        TermTracker { doc_id, position }
    }
}

/// Strict `(doc_id, position)` ordering predicate for postings.
pub fn tracker_less(a: &TermTracker, b: &TermTracker) -> bool {
    a.doc_id < b.doc_id || (a.doc_id == b.doc_id && a.position < b.position)
}

/// Exact equality predicate for postings.
pub fn tracker_equal(a: &TermTracker, b: &TermTracker) -> bool {
    a.doc_id == b.doc_id && a.position == b.position
}

/// An entity that stores documents and serves per-term posting iterators.
///
/// Every implementation MUST yield postings in strictly ascending
/// `(doc_id, position)` order from [`ReverseIndex::iterate_over_terms`]; the
/// query merge-join silently corrupts results otherwise.
pub trait ReverseIndex: Send + Sync {
    /// Iterate over the postings of `term`, ascending.
    fn iterate_over_terms(&self, term: &str) -> Box<dyn Iterator<Item = TermTracker> + Send>;

    /// Store one document's token stream, returning its new id.
    fn store_new_document(&self, tokens: &mut dyn Iterator<Item = Token>) -> Result<DocumentId>;
}
