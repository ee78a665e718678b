//! Persistence layer: posting codecs, on-disk chunks, and the chunk cache.

pub mod chunk;
pub mod manager;
pub mod postings;

pub use self::chunk::IndexChunk;
pub use self::manager::{ChainPostings, PersistenceConfig, PersistenceManager};
