//! In-memory disk handler for testing and ephemeral indexes.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::{DiskHandler, StagedWriter};

type SharedFiles = Arc<RwLock<AHashMap<String, Arc<[u8]>>>>;

/// A [`DiskHandler`] that keeps every key in memory.
///
/// Staged writes accumulate in a private buffer and replace the published
/// bytes only on finalize, mirroring the visibility rules of the file-backed
/// handler.
#[derive(Debug, Clone)]
pub struct MemoryDiskHandler {
    files: SharedFiles,
}

impl MemoryDiskHandler {
    /// Create an empty in-memory handler.
    pub fn new() -> Self {
        MemoryDiskHandler {
            files: Arc::new(RwLock::new(AHashMap::new())),
        }
    }

    /// Number of keys with published content.
    pub fn key_count(&self) -> usize {
        self.files.read().len()
    }

    /// Total published size across all keys, in bytes.
    pub fn total_size(&self) -> usize {
        self.files.read().values().map(|data| data.len()).sum()
    }
}

impl Default for MemoryDiskHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskHandler for MemoryDiskHandler {
    fn get_writer(&self, key: &str) -> Result<Box<dyn StagedWriter>> {
        Ok(Box::new(MemoryStagedWriter {
            files: Arc::clone(&self.files),
            key: key.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn get_reader(&self, key: &str) -> Result<Option<Box<dyn Read + Send>>> {
        let files = self.files.read();
        match files.get(key) {
            Some(data) => {
                let snapshot: Vec<u8> = data.to_vec();
                Ok(Some(Box::new(Cursor::new(snapshot))))
            }
            None => Ok(None),
        }
    }
}

struct MemoryStagedWriter {
    files: SharedFiles,
    key: String,
    buffer: Vec<u8>,
}

impl Write for MemoryStagedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StagedWriter for MemoryStagedWriter {
    fn finalize(self: Box<Self>) -> Result<()> {
        let mut files = self.files.write();
        files.insert(self.key, Arc::from(self.buffer.into_boxed_slice()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_has_no_reader() {
        let handler = MemoryDiskHandler::new();
        assert!(handler.get_reader("absent").unwrap().is_none());
    }

    #[test]
    fn test_write_visible_only_after_finalize() {
        let handler = MemoryDiskHandler::new();

        let mut writer = handler.get_writer("key").unwrap();
        writer.write_all(b"staged bytes").unwrap();

        // Not yet published.
        assert!(handler.get_reader("key").unwrap().is_none());

        writer.finalize().unwrap();

        let mut reader = handler.get_reader("key").unwrap().unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"staged bytes");
    }

    #[test]
    fn test_finalize_replaces_previous_state() {
        let handler = MemoryDiskHandler::new();

        let mut first = handler.get_writer("key").unwrap();
        first.write_all(b"one").unwrap();
        first.finalize().unwrap();

        let mut second = handler.get_writer("key").unwrap();
        second.write_all(b"two").unwrap();

        // A reader opened before finalize still sees the old bytes.
        let mut reader = handler.get_reader("key").unwrap().unwrap();
        second.finalize().unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"one");

        let mut reader = handler.get_reader("key").unwrap().unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"two");
    }

    #[test]
    fn test_dropped_writer_publishes_nothing() {
        let handler = MemoryDiskHandler::new();
        let mut writer = handler.get_writer("key").unwrap();
        writer.write_all(b"lost").unwrap();
        drop(writer);

        assert!(handler.get_reader("key").unwrap().is_none());
        assert_eq!(handler.key_count(), 0);
    }
}
