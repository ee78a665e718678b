//! Chunk cache and chain management.
//!
//! The manager keeps a bounded pool of [`IndexChunk`]s in memory, tracks
//! their access recency, splits chunks that outgrow the configured size, and
//! evicts least-recently-used chunks when the pool is full. Dirty chunks are
//! queued for write-back and flushed on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::concurrent::{ConcurrentList, ConcurrentMap, ConcurrentQueue, ListEntry};
use crate::error::{QuillError, Result};
use crate::index::TermTracker;
use crate::persist::IndexChunk;
use crate::storage::DiskHandler;

fn default_max_cached_chunks() -> usize {
    1024
}

fn default_max_chunk_size() -> usize {
    4096
}

/// Tuning knobs for the chunk cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Upper bound on chunks held in memory at once.
    #[serde(default = "default_max_cached_chunks")]
    pub max_cached_chunks: usize,
    /// Posting count above which a chunk is split in two.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig {
            max_cached_chunks: default_max_cached_chunks(),
            max_chunk_size: default_max_chunk_size(),
        }
    }
}

#[derive(Clone)]
struct WrappedChunk {
    chunk: Arc<IndexChunk>,
    entry: ListEntry,
}

/// Owner of every cached chunk and of the posting chains built from them.
///
/// Chains are addressed by term: the head chunk of `term` lives under the
/// key `term-<term>` and each chunk names its successor. All public methods
/// are safe to call from multiple threads.
pub struct PersistenceManager {
    config: PersistenceConfig,
    handler: Arc<dyn DiskHandler>,
    chunk_pool: ConcurrentMap<String, WrappedChunk>,
    access_list: ConcurrentList<String>,
    pending_sync: ConcurrentQueue<String>,
    cache_size: AtomicUsize,
}

impl PersistenceManager {
    /// Create a manager over the given storage backend.
    pub fn new(config: PersistenceConfig, handler: Arc<dyn DiskHandler>) -> Self {
        PersistenceManager {
            config,
            handler,
            chunk_pool: ConcurrentMap::new(),
            access_list: ConcurrentList::new(),
            pending_sync: ConcurrentQueue::new(),
            cache_size: AtomicUsize::new(0),
        }
    }

    /// Storage key of the head chunk of `term`'s chain.
    pub fn head_chunk_key(term: &str) -> String {
        format!("term-{term}")
    }

    /// Number of chunks currently cached.
    pub fn cached_chunks(&self) -> usize {
        self.cache_size.load(Ordering::Acquire)
    }

    /// Whether the chunk stored under `key` is currently resident in the
    /// cache.
    pub fn is_cached(&self, key: &str) -> bool {
        self.chunk_pool.contains_key(&key.to_string())
    }

    /// Fetch the chunk stored under `key`, loading it from disk on a miss
    /// and splitting it when it has outgrown the size bound.
    pub fn retrieve_chunk(&self, key: &str) -> Result<Arc<IndexChunk>> {
        let chunk = match self.retrieve_from_cache(key) {
            Some(chunk) => chunk,
            None => self.retrieve_from_disk(key)?,
        };

        if chunk.len() > self.config.max_chunk_size {
            self.split_chunk(&chunk);
        }

        Ok(chunk)
    }

    fn retrieve_from_cache(&self, key: &str) -> Option<Arc<IndexChunk>> {
        let wrapped = self.chunk_pool.get(&key.to_string())?;

        // Move the entry to the front of the access list.
        self.access_list.remove(&wrapped.entry);
        let entry = self.access_list.insert_front(key.to_string());
        let chunk = Arc::clone(&wrapped.chunk);
        let republished = self.chunk_pool.replace_if_present(
            &key.to_string(),
            WrappedChunk {
                chunk: Arc::clone(&chunk),
                entry,
            },
        );
        if !republished {
            // Evicted between the lookup and the re-front; the new list
            // entry must not outlive the pool entry.
            self.access_list.remove(&entry);
        }
        Some(chunk)
    }

    fn retrieve_from_disk(&self, key: &str) -> Result<Arc<IndexChunk>> {
        while self.cache_size.load(Ordering::Acquire) >= self.config.max_cached_chunks {
            self.evict_one()?;
        }

        let chunk = Arc::new(IndexChunk::open(key, Arc::clone(&self.handler))?);
        Ok(self.register_chunk(chunk))
    }

    /// Publish a chunk into the pool and access list.
    ///
    /// When another thread registered the same key concurrently, the loser's
    /// copy is dropped unread and the resident chunk is returned instead.
    fn register_chunk(&self, chunk: Arc<IndexChunk>) -> Arc<IndexChunk> {
        let key = chunk.chunk_key().to_string();
        let entry = self.access_list.insert_front(key.clone());

        let mut newly_registered = false;
        let resident = self.chunk_pool.get_or_insert_with(key.clone(), || {
            newly_registered = true;
            WrappedChunk {
                chunk: Arc::clone(&chunk),
                entry,
            }
        });

        if newly_registered {
            self.cache_size.fetch_add(1, Ordering::AcqRel);
            if chunk.is_dirty() {
                self.pending_sync.push(key);
            }
        } else {
            self.access_list.remove(&entry);
        }
        resident.chunk
    }

    fn split_chunk(&self, chunk: &Arc<IndexChunk>) {
        let new_chunk = Arc::new(chunk.split());
        log::debug!(
            "split chunk {} ({} postings kept, {} moved to {})",
            chunk.chunk_key(),
            chunk.len(),
            new_chunk.len(),
            new_chunk.chunk_key(),
        );
        self.register_chunk(new_chunk);
        self.pending_sync.push(chunk.chunk_key().to_string());
    }

    /// Evict one chunk, preferring the least recently used clean one.
    ///
    /// When every cached chunk is dirty the least recently used one is
    /// written back first and then evicted, so eviction always makes
    /// progress.
    fn evict_one(&self) -> Result<()> {
        let snapshot = self.access_list.iterate_backwards();
        if snapshot.is_empty() {
            return Err(QuillError::storage("cache full but access list is empty"));
        }

        let mut oldest: Option<(String, ListEntry, Arc<IndexChunk>)> = None;
        for item in &snapshot {
            let Some(wrapped) = self.chunk_pool.get(&item.value) else {
                continue;
            };
            if !wrapped.chunk.is_dirty() {
                if self.drop_chunk(&item.value, &item.entry) {
                    log::trace!("evicted clean chunk {}", item.value);
                    return Ok(());
                }
                continue;
            }
            if oldest.is_none() {
                oldest = Some((item.value.clone(), item.entry, wrapped.chunk));
            }
        }

        // No clean victim; force a write-back of the coldest dirty chunk.
        if let Some((key, entry, chunk)) = oldest {
            chunk.write_back()?;
            if self.drop_chunk(&key, &entry) {
                log::debug!("flushed and evicted dirty chunk {key}");
            }
            return Ok(());
        }

        // Every candidate in this snapshot was superseded by a concurrent
        // retrieve; the caller re-checks the cache size and retries.
        Ok(())
    }

    /// Remove the chunk from the pool and access list, but only when the
    /// pool still maps the key to the exact entry being evicted. A concurrent
    /// retrieve may have re-fronted the chunk; its newer entry wins.
    fn drop_chunk(&self, key: &str, entry: &ListEntry) -> bool {
        let removed = self
            .chunk_pool
            .remove_if(&key.to_string(), |wrapped| wrapped.entry == *entry);
        if removed.is_none() {
            return false;
        }
        self.access_list.remove(entry);
        self.cache_size.fetch_sub(1, Ordering::AcqRel);
        true
    }

    /// Append postings to the tail chunk of `term`'s chain.
    ///
    /// Document ids are assigned monotonically, so new postings always sort
    /// at or after the tail chunk's contents and the chain order by document
    /// range is preserved.
    pub fn insert_postings(
        &self,
        term: &str,
        postings: impl Iterator<Item = TermTracker>,
    ) -> Result<()> {
        let mut chunk = self.retrieve_chunk(&Self::head_chunk_key(term))?;
        loop {
            let next_key = chunk.next_chunk_key();
            if next_key.is_empty() {
                break;
            }
            chunk = self.retrieve_chunk(&next_key)?;
        }

        chunk.insert_iterable(postings);
        if chunk.is_dirty() {
            self.pending_sync.push(chunk.chunk_key().to_string());
        }
        Ok(())
    }

    /// Write back every chunk queued for synchronization, then sweep the
    /// cache for stragglers dirtied without being queued.
    pub fn flush(&self) -> Result<()> {
        let mut flushed = AHashSet::new();

        while let Some(key) = self.pending_sync.try_pop() {
            if !flushed.insert(key.clone()) {
                continue;
            }
            if let Some(wrapped) = self.chunk_pool.get(&key) {
                wrapped.chunk.write_back()?;
            }
        }

        for item in self.access_list.iterate_forward() {
            if flushed.contains(&item.value) {
                continue;
            }
            if let Some(wrapped) = self.chunk_pool.get(&item.value) {
                wrapped.chunk.write_back()?;
            }
        }

        Ok(())
    }
}

/// Lazy walk of a term's chunk chain, yielding postings in ascending order.
///
/// Only the current chunk's snapshot is buffered; the next chunk in the
/// chain is retrieved when the buffer runs dry, so driving a query over a
/// long posting list never pulls the whole chain through the cache at once.
/// The walk stops at the first empty chunk, which also covers terms that
/// were never indexed at all. A retrieval error is yielded once and ends
/// the iteration.
pub struct ChainPostings {
    manager: Arc<PersistenceManager>,
    buffered: std::vec::IntoIter<TermTracker>,
    next_chunk_key: Option<String>,
}

impl ChainPostings {
    /// Start walking `term`'s chain from its head chunk.
    pub fn new(manager: Arc<PersistenceManager>, term: &str) -> Self {
        ChainPostings {
            manager,
            buffered: Vec::new().into_iter(),
            next_chunk_key: Some(PersistenceManager::head_chunk_key(term)),
        }
    }
}

impl Iterator for ChainPostings {
    type Item = Result<TermTracker>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(posting) = self.buffered.next() {
                return Some(Ok(posting));
            }

            let key = self.next_chunk_key.take()?;
            let chunk = match self.manager.retrieve_chunk(&key) {
                Ok(chunk) => chunk,
                Err(err) => return Some(Err(err)),
            };
            if chunk.is_empty() {
                return None;
            }

            self.buffered = chunk.to_vec().into_iter();
            let next_key = chunk.next_chunk_key();
            if !next_key.is_empty() {
                self.next_chunk_key = Some(next_key);
            }
        }
    }
}

impl std::fmt::Debug for ChainPostings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainPostings")
            .field("next_chunk_key", &self.next_chunk_key)
            .finish()
    }
}

impl std::fmt::Debug for PersistenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceManager")
            .field("config", &self.config)
            .field("cached_chunks", &self.cached_chunks())
            .finish()
    }
}
