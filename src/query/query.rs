//! The executable query interface.

use ahash::AHashSet;

use crate::index::{DocumentId, ReverseIndex, TermPosition, Token};

/// Outcome of evaluating a query at its current cursor position.
#[derive(Debug, Clone, Default)]
pub struct Match {
    /// Whether the current position satisfies the query.
    pub success: bool,
    /// Document the match refers to. Meaningless unless `success` is set.
    pub doc_id: DocumentId,
    /// Position of the first involved term occurrence.
    pub start_position: TermPosition,
    /// Position of the last involved term occurrence.
    pub end_position: TermPosition,
    /// The term occurrences that produced the match, for highlighting.
    pub involved_tokens: AHashSet<Token>,
}

impl Match {
    /// A match that did not succeed.
    pub fn failure() -> Self {
        Match::default()
    }
}

/// A node of an executable query tree.
///
/// A query is a cursor over the documents it matches. The driving loop is:
/// [`Query::init`] once, then [`Query::run`] to evaluate the current
/// position and [`Query::advance`] to move on, until [`Query::ended`]
/// reports exhaustion, and finally [`Query::close`].
///
/// `run` is free of side effects: calling it twice without an intervening
/// `advance` yields the same match.
pub trait Query: Send {
    /// Bind the query to an index and position it on the first posting.
    fn init(&mut self, index: &dyn ReverseIndex);

    /// Evaluate the query at the current cursor position.
    fn run(&self) -> Match;

    /// Move the cursor one step forward.
    fn advance(&mut self);

    /// Whether the cursor moved past the last posting.
    fn ended(&self) -> bool;

    /// Release the underlying posting iterators.
    fn close(&mut self);

    /// Document id and position of the current cursor, `(0, 0)` when ended.
    ///
    /// Drives the merge-join in composite queries: the child with the
    /// smallest coordinates is the one to advance.
    fn coordinates(&self) -> (DocumentId, TermPosition);
}
