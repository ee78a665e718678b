//! Concurrent container primitives used by the cache and index layers.

pub mod list;
pub mod map;
pub mod queue;
pub mod rwlock;
pub mod stack;

pub use self::list::{ConcurrentList, ListEntry, ListItem};
pub use self::map::ConcurrentMap;
pub use self::queue::ConcurrentQueue;
pub use self::rwlock::RwFairLock;
pub use self::stack::ConcurrentStack;
