//! A concurrent doubly-linked list with lazy deletion.
//!
//! The cache layer uses this list to track chunk access recency: entries are
//! inserted at the front on every access and removed from arbitrary positions
//! on eviction. Removal is *lazy*: an entry is tombstoned with an atomic flag
//! and only physically unlinked once the tombstoned/total ratio exceeds a
//! threshold. A single thread performs the physical prune at a time, claimed
//! with a best-effort `try_lock`; if the ratio is still too high afterwards
//! the next removal retries.
//!
//! Nodes live in an arena of slots addressed by stable indices, with a
//! per-slot generation counter so a handle to a removed-and-recycled slot can
//! never touch the wrong value.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

const NIL: usize = usize::MAX;

/// Fraction of tombstoned entries that triggers a physical prune.
const DEFAULT_PRUNE_THRESHOLD: f64 = 0.4;

/// Handle to one list entry, returned by [`ConcurrentList::insert_front`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    index: usize,
    generation: u64,
}

/// A value paired with its entry handle, yielded by iteration.
#[derive(Debug, Clone)]
pub struct ListItem<T> {
    /// The stored value.
    pub value: T,
    /// Handle usable with [`ConcurrentList::remove`].
    pub entry: ListEntry,
}

struct Slot<T> {
    value: Option<T>,
    generation: u64,
    tombstoned: AtomicBool,
    prev: usize,
    next: usize,
}

struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
}

/// A doubly-linked list safe for concurrent insertion, removal and iteration.
pub struct ConcurrentList<T> {
    arena: RwLock<Arena<T>>,
    live: AtomicUsize,
    tombstones: AtomicUsize,
    prune_lock: Mutex<()>,
    prune_threshold: f64,
}

impl<T: Clone> ConcurrentList<T> {
    /// Create an empty list with the default prune threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_PRUNE_THRESHOLD)
    }

    /// Create an empty list with a custom tombstone ratio threshold.
    pub fn with_threshold(prune_threshold: f64) -> Self {
        ConcurrentList {
            arena: RwLock::new(Arena {
                slots: Vec::new(),
                free: Vec::new(),
                head: NIL,
                tail: NIL,
            }),
            live: AtomicUsize::new(0),
            tombstones: AtomicUsize::new(0),
            prune_lock: Mutex::new(()),
            prune_threshold,
        }
    }

    /// Number of live (non-tombstoned) entries.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Whether no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a value at the front of the list.
    pub fn insert_front(&self, value: T) -> ListEntry {
        let mut arena = self.arena.write();

        let index = match arena.free.pop() {
            Some(index) => {
                let slot = &mut arena.slots[index];
                slot.value = Some(value);
                slot.tombstoned.store(false, Ordering::Release);
                slot.prev = NIL;
                slot.next = NIL;
                index
            }
            None => {
                arena.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                    tombstoned: AtomicBool::new(false),
                    prev: NIL,
                    next: NIL,
                });
                arena.slots.len() - 1
            }
        };

        let old_head = arena.head;
        arena.slots[index].next = old_head;
        if old_head != NIL {
            arena.slots[old_head].prev = index;
        } else {
            arena.tail = index;
        }
        arena.head = index;

        let generation = arena.slots[index].generation;
        drop(arena);

        self.live.fetch_add(1, Ordering::AcqRel);
        ListEntry { index, generation }
    }

    /// Tombstone the entry. Returns `false` when the handle is stale or the
    /// entry was already removed.
    pub fn remove(&self, entry: &ListEntry) -> bool {
        let removed = {
            let arena = self.arena.read();
            match arena.slots.get(entry.index) {
                Some(slot) if slot.generation == entry.generation => {
                    !slot.tombstoned.swap(true, Ordering::AcqRel)
                }
                _ => false,
            }
        };

        if removed {
            self.live.fetch_sub(1, Ordering::AcqRel);
            self.tombstones.fetch_add(1, Ordering::AcqRel);
            self.maybe_prune();
        }
        removed
    }

    /// Snapshot the live entries front-to-back.
    pub fn iterate_forward(&self) -> Vec<ListItem<T>> {
        self.snapshot(false)
    }

    /// Snapshot the live entries back-to-front (least recent first when the
    /// list is used as an access list).
    pub fn iterate_backwards(&self) -> Vec<ListItem<T>> {
        self.snapshot(true)
    }

    fn snapshot(&self, backwards: bool) -> Vec<ListItem<T>> {
        let arena = self.arena.read();
        let mut items = Vec::with_capacity(self.live.load(Ordering::Relaxed));

        let mut cursor = if backwards { arena.tail } else { arena.head };
        while cursor != NIL {
            let slot = &arena.slots[cursor];
            if !slot.tombstoned.load(Ordering::Acquire) {
                if let Some(value) = &slot.value {
                    items.push(ListItem {
                        value: value.clone(),
                        entry: ListEntry {
                            index: cursor,
                            generation: slot.generation,
                        },
                    });
                }
            }
            cursor = if backwards { slot.prev } else { slot.next };
        }

        items
    }

    /// Physically unlink tombstoned slots once their ratio crosses the
    /// threshold. Only one thread prunes at a time.
    fn maybe_prune(&self) {
        let tombstones = self.tombstones.load(Ordering::Acquire);
        let total = tombstones + self.live.load(Ordering::Acquire);
        if tombstones == 0 || (tombstones as f64) / (total as f64) <= self.prune_threshold {
            return;
        }

        let Some(_prune_guard) = self.prune_lock.try_lock() else {
            return;
        };

        let mut arena = self.arena.write();
        let mut pruned = 0usize;
        let mut cursor = arena.head;
        while cursor != NIL {
            let next = arena.slots[cursor].next;
            if arena.slots[cursor].tombstoned.load(Ordering::Acquire) {
                Self::unlink(&mut arena, cursor);
                pruned += 1;
            }
            cursor = next;
        }
        drop(arena);

        if pruned > 0 {
            log::trace!("pruned {pruned} tombstoned list entries");
            self.tombstones.fetch_sub(pruned, Ordering::AcqRel);
        }
    }

    fn unlink(arena: &mut Arena<T>, index: usize) {
        let (prev, next) = {
            let slot = &arena.slots[index];
            (slot.prev, slot.next)
        };

        if prev != NIL {
            arena.slots[prev].next = next;
        } else {
            arena.head = next;
        }
        if next != NIL {
            arena.slots[next].prev = prev;
        } else {
            arena.tail = prev;
        }

        let slot = &mut arena.slots[index];
        slot.value = None;
        slot.generation = slot.generation.wrapping_add(1);
        slot.prev = NIL;
        slot.next = NIL;
        arena.free.push(index);
    }
}

impl<T: Clone> Default for ConcurrentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ConcurrentList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentList")
            .field("live", &self.live.load(Ordering::Relaxed))
            .field("tombstones", &self.tombstones.load(Ordering::Relaxed))
            .finish()
    }
}
