//! Search execution: driving a query tree over an index and ranking the
//! matching documents.

pub mod collector;
pub mod searcher;

use serde::{Deserialize, Serialize};

use crate::index::DocumentId;

pub use self::collector::BoundedResultSet;
pub use self::searcher::search;

/// One ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching document.
    pub doc_id: DocumentId,
    /// Relevance of the document for the executed query.
    pub score: f64,
}
