//! Storage abstraction for chunk persistence.
//!
//! Every disk resource is identified by a string key. The [`DiskHandler`]
//! trait hands out readers and staged writers for a key; a staged write only
//! becomes visible to readers once [`StagedWriter::finalize`] consumes the
//! writer, which makes the publish step atomic. The contract assumes a single
//! writer per key at a time; readers of a key keep seeing the previous state
//! until the write is finalized.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::io::{Read, Write};

use crate::error::Result;

pub use self::file::FileDiskHandler;
pub use self::memory::MemoryDiskHandler;

/// A write staged against a key, published atomically on finalize.
pub trait StagedWriter: Write + Send {
    /// Atomically publish the staged bytes under the writer's key.
    ///
    /// Consumes the writer, so a write can be finalized at most once. A
    /// dropped, unfinalized writer leaves the previous state untouched.
    fn finalize(self: Box<Self>) -> Result<()>;
}

/// A keyed byte store with staged writes and snapshot reads.
pub trait DiskHandler: Send + Sync + Debug {
    /// Open a staged writer for `key`.
    fn get_writer(&self, key: &str) -> Result<Box<dyn StagedWriter>>;

    /// Open a reader over the last finalized state of `key`, or `None` when
    /// the key has never been written.
    fn get_reader(&self, key: &str) -> Result<Option<Box<dyn Read + Send>>>;
}
