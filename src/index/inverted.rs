//! The persisted reverse index.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::error::{QuillError, Result};
use crate::index::{DocumentId, ReverseIndex, TermTracker, Token};
use crate::persist::{ChainPostings, PersistenceManager};

/// A [`ReverseIndex`] backed by the chunked persistence layer.
///
/// Each term's posting list lives in a chain of disk chunks managed by the
/// [`PersistenceManager`]; this type only buckets incoming tokens by term and
/// hands the batches over.
pub struct InvertedIndex {
    manager: Arc<PersistenceManager>,
    next_document_id: AtomicU64,
    read_failure: Arc<Mutex<Option<QuillError>>>,
}

impl InvertedIndex {
    /// Create an index on top of an existing persistence manager.
    pub fn new(manager: Arc<PersistenceManager>) -> Self {
        InvertedIndex {
            manager,
            next_document_id: AtomicU64::new(1),
            read_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Create an index whose document-id counter resumes after
    /// `highest_document_id`, for reopening an existing store.
    pub fn with_next_document_id(
        manager: Arc<PersistenceManager>,
        highest_document_id: DocumentId,
    ) -> Self {
        InvertedIndex {
            manager,
            next_document_id: AtomicU64::new(highest_document_id + 1),
            read_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Write every dirty chunk back to storage.
    ///
    /// Posting iterators cannot carry errors, so a chain read failure during
    /// a query degrades that term to an empty stream and is recorded here;
    /// the next flush reports it instead of letting it vanish into the log.
    pub fn flush(&self) -> Result<()> {
        self.manager.flush()?;
        match self.read_failure.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Take the first chain read failure recorded since the last check.
    pub fn take_read_failure(&self) -> Option<QuillError> {
        self.read_failure.lock().take()
    }
}

/// Degrades chain read errors to end-of-stream while recording the first
/// one for [`InvertedIndex::flush`] to surface.
struct RecordedPostings {
    inner: ChainPostings,
    term: String,
    failure: Arc<Mutex<Option<QuillError>>>,
}

impl Iterator for RecordedPostings {
    type Item = TermTracker;

    fn next(&mut self) -> Option<TermTracker> {
        match self.inner.next()? {
            Ok(posting) => Some(posting),
            Err(err) => {
                log::error!("failed to read posting chain for {:?}: {err}", self.term);
                let mut failure = self.failure.lock();
                if failure.is_none() {
                    *failure = Some(err);
                }
                None
            }
        }
    }
}

impl ReverseIndex for InvertedIndex {
    fn iterate_over_terms(&self, term: &str) -> Box<dyn Iterator<Item = TermTracker> + Send> {
        Box::new(RecordedPostings {
            inner: ChainPostings::new(Arc::clone(&self.manager), term),
            term: term.to_string(),
            failure: Arc::clone(&self.read_failure),
        })
    }

    fn store_new_document(&self, tokens: &mut dyn Iterator<Item = Token>) -> Result<DocumentId> {
        let doc_id = self.next_document_id.fetch_add(1, Ordering::AcqRel);

        // Bucket the stream by term so each chain is touched once.
        let mut buckets: AHashMap<String, Vec<TermTracker>> = AHashMap::new();
        for token in tokens {
            buckets
                .entry(token.stemmed_text)
                .or_default()
                .push(TermTracker::new(doc_id, token.position));
        }

        for (term, postings) in buckets {
            self.manager.insert_postings(&term, postings.into_iter())?;
        }

        Ok(doc_id)
    }
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndex")
            .field("manager", &self.manager)
            .finish()
    }
}
