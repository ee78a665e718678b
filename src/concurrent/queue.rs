//! A concurrent FIFO queue.
//!
//! Backed by an unbounded channel, which gives multi-producer multi-consumer
//! semantics without a hand-rolled lock discipline. The cache layer uses it
//! to track chunk keys awaiting write-back.

use crossbeam_channel::{Receiver, Sender, unbounded};

/// An unbounded FIFO queue safe for concurrent producers and consumers.
pub struct ConcurrentQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> ConcurrentQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        ConcurrentQueue { sender, receiver }
    }

    /// Append a value at the back.
    pub fn push(&self, value: T) {
        // The receiver lives as long as the queue, so the channel can never
        // be disconnected here.
        let _ = self.sender.send(value);
    }

    /// Take the value at the front, if any.
    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Whether the queue currently holds no values.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("len", &self.len())
            .finish()
    }
}
