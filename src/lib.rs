//! # Quill
//!
//! A minimal full-text search engine with a persisted inverted index.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Segmented, chunked posting lists persisted through a pluggable storage
//!   backend
//! - Variable-byte delta compression of postings on disk
//! - Bounded LRU chunk cache with write-back and automatic chunk splitting
//! - Boolean and proximity queries (`AND`, `OR`, `XOR`, `NEAR`) executed as
//!   a single merge-join pass over posting streams
//! - Safe concurrent indexing and searching

pub mod concurrent;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod search;
pub mod storage;
pub mod util;

pub use error::{QuillError, Result};
pub use index::{DocumentId, InvertedIndex, MemoryIndex, ReverseIndex, TermPosition, Token};
pub use persist::{PersistenceConfig, PersistenceManager};
pub use search::{SearchResult, search};
pub use storage::{DiskHandler, FileDiskHandler, MemoryDiskHandler};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
