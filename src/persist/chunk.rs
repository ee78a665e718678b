//! One on-disk chunk of a term's posting chain.
//!
//! A full posting list is a linked chain of chunks: each chunk stores a
//! sorted run of postings plus the key of the next chunk in the chain (empty
//! for the tail). The on-disk layout is three length-prefixed header strings
//! (own key, next key, split counter as decimal text) followed by the
//! delta-compressed posting stream, which runs to end of file.

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::concurrent::RwFairLock;
use crate::error::{QuillError, Result};
use crate::index::{Segment, TermTracker};
use crate::persist::postings::{self, PostingsReader};
use crate::storage::DiskHandler;

struct ChunkCore {
    segment: Segment,
    next_chunk_key: String,
    split_counter: u64,
}

/// A chunk of a term's posting chain, cached in memory and written back to
/// disk on demand.
///
/// Readers snapshot the postings concurrently; inserts and splits take the
/// exclusive side of a writer-preferring lock. The dirty flag lives outside
/// the lock so the cache can test it without contending with readers.
pub struct IndexChunk {
    chunk_key: String,
    core: RwFairLock<ChunkCore>,
    pending_write_back: AtomicBool,
    handler: Arc<dyn DiskHandler>,
}

impl IndexChunk {
    /// Open the chunk stored under `chunk_key`, or create an empty one when
    /// the key has never been written.
    pub fn open(chunk_key: &str, handler: Arc<dyn DiskHandler>) -> Result<Self> {
        let mut core = ChunkCore {
            segment: Segment::new(),
            next_chunk_key: String::new(),
            split_counter: 0,
        };

        if let Some(mut reader) = handler.get_reader(chunk_key)? {
            Self::load(chunk_key, &mut reader, &mut core)?;
        }

        Ok(IndexChunk {
            chunk_key: chunk_key.to_string(),
            core: RwFairLock::new(core),
            pending_write_back: AtomicBool::new(false),
            handler,
        })
    }

    fn load(chunk_key: &str, reader: &mut Box<dyn Read + Send>, core: &mut ChunkCore) -> Result<()> {
        let corrupt = |reason: String| QuillError::corrupt_chunk(chunk_key, reason);

        let stored_key = postings::read_string(reader)
            .map_err(|err| corrupt(format!("unreadable chunk key: {err}")))?;
        if stored_key != chunk_key {
            return Err(corrupt(format!("stored key {stored_key:?} does not match")));
        }

        core.next_chunk_key = postings::read_string(reader)
            .map_err(|err| corrupt(format!("unreadable next-chunk key: {err}")))?;

        let split_counter_text = postings::read_string(reader)
            .map_err(|err| corrupt(format!("unreadable split counter: {err}")))?;
        core.split_counter = split_counter_text
            .parse()
            .map_err(|_| corrupt(format!("split counter {split_counter_text:?} is not a number")))?;

        for posting in PostingsReader::new(reader) {
            let posting = posting.map_err(|err| corrupt(format!("bad posting: {err}")))?;
            core.segment.add(posting);
        }

        Ok(())
    }

    /// The key this chunk is stored under.
    pub fn chunk_key(&self) -> &str {
        &self.chunk_key
    }

    /// Key of the next chunk in the chain, or empty for the tail.
    pub fn next_chunk_key(&self) -> String {
        self.core.read().next_chunk_key.clone()
    }

    /// Whether the in-memory state differs from what is on disk.
    pub fn is_dirty(&self) -> bool {
        self.pending_write_back.load(Ordering::Acquire)
    }

    /// Number of postings currently held.
    pub fn len(&self) -> usize {
        self.core.read().segment.len()
    }

    /// Whether the chunk holds no postings.
    pub fn is_empty(&self) -> bool {
        self.core.read().segment.is_empty()
    }

    /// Snapshot the postings in ascending order.
    pub fn to_vec(&self) -> Vec<TermTracker> {
        self.core.read().segment.to_vec()
    }

    /// Insert a batch of postings, marking the chunk dirty when anything new
    /// landed.
    pub fn insert_iterable(&self, postings: impl Iterator<Item = TermTracker>) {
        let mut core = self.core.write();
        let mut inserted = false;
        for posting in postings {
            inserted |= core.segment.add(posting);
        }
        if inserted {
            self.pending_write_back.store(true, Ordering::Release);
        }
    }

    /// Serialize the chunk to disk if it is dirty.
    ///
    /// The dirty flag is claimed before writing; on failure it is restored so
    /// a later flush retries.
    pub fn write_back(&self) -> Result<()> {
        if !self.pending_write_back.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        if let Err(err) = self.write_back_inner() {
            self.pending_write_back.store(true, Ordering::Release);
            return Err(err);
        }
        Ok(())
    }

    fn write_back_inner(&self) -> Result<()> {
        let mut buffer = Vec::new();
        {
            let core = self.core.read();
            postings::write_string(&mut buffer, &self.chunk_key);
            postings::write_string(&mut buffer, &core.next_chunk_key);
            postings::write_string(&mut buffer, &core.split_counter.to_string());
            postings::write_postings(&mut buffer, core.segment.iter());
        }

        let mut writer = self.handler.get_writer(&self.chunk_key)?;
        writer.write_all(&buffer)?;
        writer.finalize()
    }

    /// Split off the upper half of the postings into a fresh chunk linked
    /// after this one.
    ///
    /// The new chunk's key is derived from this chunk's key and a counter
    /// that survives restarts, so repeated splits of the same chunk never
    /// collide. Both halves come out dirty: the survivor lost postings and
    /// gained a new successor, and the new chunk exists nowhere on disk yet.
    pub fn split(&self) -> IndexChunk {
        let mut core = self.core.write();
        core.split_counter += 1;

        let new_key = format!("{}-{}", self.chunk_key, core.split_counter);
        let upper = core.segment.split_off_upper_half();
        let new_core = ChunkCore {
            segment: Segment::from_sorted(upper),
            next_chunk_key: std::mem::replace(&mut core.next_chunk_key, new_key.clone()),
            split_counter: 0,
        };
        self.pending_write_back.store(true, Ordering::Release);

        IndexChunk {
            chunk_key: new_key,
            core: RwFairLock::new(new_core),
            pending_write_back: AtomicBool::new(true),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl std::fmt::Debug for IndexChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexChunk")
            .field("chunk_key", &self.chunk_key)
            .field("len", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryDiskHandler;

    fn handler() -> Arc<dyn DiskHandler> {
        Arc::new(MemoryDiskHandler::new())
    }

    fn postings(pairs: &[(u64, u64)]) -> Vec<TermTracker> {
        pairs
            .iter()
            .map(|&(doc, pos)| TermTracker::new(doc, pos))
            .collect()
    }

    #[test]
    fn test_open_missing_key_creates_empty_chunk() {
        let chunk = IndexChunk::open("term-absent", handler()).unwrap();
        assert!(chunk.is_empty());
        assert!(!chunk.is_dirty());
        assert_eq!(chunk.next_chunk_key(), "");
    }

    #[test]
    fn test_insert_marks_dirty_and_write_back_persists() {
        let handler = handler();
        let chunk = IndexChunk::open("term-rust", Arc::clone(&handler)).unwrap();

        chunk.insert_iterable(postings(&[(1, 0), (1, 4), (3, 2)]).into_iter());
        assert!(chunk.is_dirty());
        chunk.write_back().unwrap();
        assert!(!chunk.is_dirty());

        let reloaded = IndexChunk::open("term-rust", handler).unwrap();
        assert_eq!(reloaded.to_vec(), postings(&[(1, 0), (1, 4), (3, 2)]));
        assert!(!reloaded.is_dirty());
    }

    #[test]
    fn test_duplicate_inserts_do_not_dirty_a_clean_chunk() {
        let handler = handler();
        let chunk = IndexChunk::open("term-dup", Arc::clone(&handler)).unwrap();
        chunk.insert_iterable(postings(&[(1, 0)]).into_iter());
        chunk.write_back().unwrap();

        chunk.insert_iterable(postings(&[(1, 0)]).into_iter());
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn test_write_back_on_clean_chunk_is_a_no_op() {
        let memory = MemoryDiskHandler::new();
        let chunk = IndexChunk::open("term-clean", Arc::new(memory.clone())).unwrap();
        chunk.write_back().unwrap();
        assert_eq!(memory.key_count(), 0);
    }

    #[test]
    fn test_split_moves_upper_half_and_links_chain() {
        let chunk = IndexChunk::open("term-big", handler()).unwrap();
        chunk.insert_iterable(postings(&[(1, 0), (2, 0), (3, 0), (4, 0)]).into_iter());

        let new_chunk = chunk.split();

        assert_eq!(new_chunk.chunk_key(), "term-big-1");
        assert_eq!(chunk.next_chunk_key(), "term-big-1");
        assert_eq!(new_chunk.next_chunk_key(), "");
        assert_eq!(chunk.to_vec(), postings(&[(1, 0), (2, 0)]));
        assert_eq!(new_chunk.to_vec(), postings(&[(3, 0), (4, 0)]));
        assert!(chunk.is_dirty());
        assert!(new_chunk.is_dirty());
    }

    #[test]
    fn test_split_preserves_existing_successor() {
        let chunk = IndexChunk::open("term-mid", handler()).unwrap();
        chunk.insert_iterable(postings(&[(1, 0), (2, 0)]).into_iter());
        let first_split = chunk.split();
        let second_split = chunk.split();

        // The newest chunk slots in between the survivor and the first split.
        assert_eq!(chunk.next_chunk_key(), second_split.chunk_key());
        assert_eq!(second_split.next_chunk_key(), first_split.chunk_key());
    }

    #[test]
    fn test_split_counter_survives_reload() {
        let handler = handler();
        let chunk = IndexChunk::open("term-count", Arc::clone(&handler)).unwrap();
        chunk.insert_iterable(postings(&[(1, 0), (2, 0)]).into_iter());
        let split_one = chunk.split();
        chunk.write_back().unwrap();
        split_one.write_back().unwrap();

        let reloaded = IndexChunk::open("term-count", handler).unwrap();
        let split_two = reloaded.split();
        assert_eq!(split_two.chunk_key(), "term-count-2");
    }

    #[test]
    fn test_corrupt_header_is_rejected() {
        let memory = MemoryDiskHandler::new();
        {
            let mut writer = memory.get_writer("term-bad").unwrap();
            writer.write_all(&[0xFF, 0xFF]).unwrap();
            writer.finalize().unwrap();
        }

        let result = IndexChunk::open("term-bad", Arc::new(memory));
        assert!(matches!(result, Err(QuillError::CorruptChunk { .. })));
    }

    #[test]
    fn test_mismatched_stored_key_is_rejected() {
        let memory = MemoryDiskHandler::new();
        {
            let mut buffer = Vec::new();
            postings::write_string(&mut buffer, "term-other");
            postings::write_string(&mut buffer, "");
            postings::write_string(&mut buffer, "0");
            let mut writer = memory.get_writer("term-bad").unwrap();
            writer.write_all(&buffer).unwrap();
            writer.finalize().unwrap();
        }

        let result = IndexChunk::open("term-bad", Arc::new(memory));
        assert!(matches!(result, Err(QuillError::CorruptChunk { .. })));
    }
}
