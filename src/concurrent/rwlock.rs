//! A writer-preferring read/write lock.
//!
//! Plain read/write locks let a continuous stream of readers starve writers.
//! This wrapper inverts the bias: readers are held at a gate while *any*
//! write is pending, not just while one holds the lock. In an inverted index
//! reads vastly outnumber writes, so keeping writers from piling up behind
//! readers is the right trade.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A read/write lock that prioritizes pending writers over new readers.
pub struct RwFairLock<T> {
    data: RwLock<T>,
    pending_writers: AtomicUsize,
    gate: Mutex<()>,
    gate_released: Condvar,
}

impl<T> RwFairLock<T> {
    /// Create a new lock wrapping `value`.
    pub fn new(value: T) -> Self {
        RwFairLock {
            data: RwLock::new(value),
            pending_writers: AtomicUsize::new(0),
            gate: Mutex::new(()),
            gate_released: Condvar::new(),
        }
    }

    /// Acquire a shared read guard.
    ///
    /// Blocks while any write is pending, then takes the underlying shared
    /// lock. Multiple readers hold the lock concurrently.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        let mut gate = self.gate.lock();
        while self.pending_writers.load(Ordering::Acquire) > 0 {
            self.gate_released.wait(&mut gate);
        }
        drop(gate);
        self.data.read()
    }

    /// Acquire an exclusive write guard.
    ///
    /// Registers the pending write first so new readers stop entering, then
    /// waits for current readers to drain.
    pub fn write(&self) -> FairWriteGuard<'_, T> {
        self.pending_writers.fetch_add(1, Ordering::AcqRel);
        FairWriteGuard {
            lock: self,
            inner: Some(self.data.write()),
        }
    }

    /// Consume the lock and return the wrapped value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RwFairLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RwFairLock")
            .field(
                "pending_writers",
                &self.pending_writers.load(Ordering::Relaxed),
            )
            .finish()
    }
}

/// Exclusive guard returned by [`RwFairLock::write`].
///
/// On drop it releases the underlying lock, unregisters the pending write,
/// and wakes the readers waiting at the gate.
pub struct FairWriteGuard<'a, T> {
    lock: &'a RwFairLock<T>,
    inner: Option<RwLockWriteGuard<'a, T>>,
}

impl<T> Deref for FairWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner.as_ref().unwrap()
    }
}

impl<T> DerefMut for FairWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner.as_mut().unwrap()
    }
}

impl<T> Drop for FairWriteGuard<'_, T> {
    fn drop(&mut self) {
        // Release the data lock before opening the gate so woken readers
        // acquire immediately instead of bouncing.
        self.inner.take();
        let gate = self.lock.gate.lock();
        self.lock.pending_writers.fetch_sub(1, Ordering::AcqRel);
        self.lock.gate_released.notify_all();
        drop(gate);
    }
}
