//! The leaf query: exact term lookup.

use ahash::AHashSet;

use crate::index::{DocumentId, ReverseIndex, TermPosition, TermTracker, Token};
use crate::query::{Match, Query};

/// A query matching every occurrence of a single term.
///
/// Holds a one-posting lookahead over the term's posting iterator, so `run`
/// and `coordinates` can inspect the current posting without consuming it.
pub struct ExactQuery {
    term: String,
    postings: Option<Box<dyn Iterator<Item = TermTracker> + Send>>,
    current: Option<TermTracker>,
}

impl ExactQuery {
    /// A query for `term`, unbound until [`Query::init`] is called.
    pub fn new<S: Into<String>>(term: S) -> Self {
        ExactQuery {
            term: term.into(),
            postings: None,
            current: None,
        }
    }

    /// A query over a fixed posting list, for tests and synthetic trees.
    /// The slice must be in ascending `(doc_id, position)` order.
    pub fn from_postings<S: Into<String>>(term: S, postings: Vec<TermTracker>) -> Self {
        let mut iterator: Box<dyn Iterator<Item = TermTracker> + Send> =
            Box::new(postings.into_iter());
        let current = iterator.next();
        ExactQuery {
            term: term.into(),
            postings: Some(iterator),
            current,
        }
    }

    /// The term this query looks for.
    pub fn term(&self) -> &str {
        &self.term
    }
}

impl Query for ExactQuery {
    fn init(&mut self, index: &dyn ReverseIndex) {
        let mut postings = index.iterate_over_terms(&self.term);
        self.current = postings.next();
        self.postings = Some(postings);
    }

    fn run(&self) -> Match {
        let Some(posting) = self.current else {
            return Match::failure();
        };

        let mut involved_tokens = AHashSet::new();
        involved_tokens.insert(Token::new(self.term.clone(), posting.position));

        Match {
            success: true,
            doc_id: posting.doc_id,
            start_position: posting.position,
            end_position: posting.position,
            involved_tokens,
        }
    }

    fn advance(&mut self) {
        if let Some(postings) = self.postings.as_mut() {
            self.current = postings.next();
        }
    }

    fn ended(&self) -> bool {
        self.current.is_none()
    }

    fn close(&mut self) {
        self.postings = None;
        self.current = None;
    }

    fn coordinates(&self) -> (DocumentId, TermPosition) {
        match self.current {
            Some(posting) => (posting.doc_id, posting.position),
            None => (0, 0),
        }
    }
}

impl std::fmt::Debug for ExactQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExactQuery")
            .field("term", &self.term)
            .field("current", &self.current)
            .finish()
    }
}
