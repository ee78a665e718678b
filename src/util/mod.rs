//! Small self-contained utilities used across the crate.

pub mod heap;
pub mod sorted;
pub mod varint;

pub use self::heap::Heap;
pub use self::sorted::SortedVec;
