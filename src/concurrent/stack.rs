//! A concurrent LIFO stack.
//!
//! Push and pop operate on a linked head, Treiber style. In Rust a CAS loop
//! over raw node pointers needs an epoch/hazard reclamation scheme to be
//! sound, so the head swap is guarded by a mutex instead; the linked
//! structure and the push/pop semantics are unchanged.

use parking_lot::Mutex;

struct StackNode<T> {
    value: T,
    next: Option<Box<StackNode<T>>>,
}

/// A stack safe for concurrent push and pop from multiple threads.
pub struct ConcurrentStack<T> {
    head: Mutex<Option<Box<StackNode<T>>>>,
}

impl<T> ConcurrentStack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        ConcurrentStack {
            head: Mutex::new(None),
        }
    }

    /// Push a value onto the top of the stack.
    pub fn push(&self, value: T) {
        let mut head = self.head.lock();
        let next = head.take();
        *head = Some(Box::new(StackNode { value, next }));
    }

    /// Pop the value at the top of the stack, if any.
    pub fn pop(&self) -> Option<T> {
        let mut head = self.head.lock();
        let node = head.take()?;
        *head = node.next;
        Some(node.value)
    }

    /// Whether the stack currently holds no values.
    pub fn is_empty(&self) -> bool {
        self.head.lock().is_none()
    }
}

impl<T> Default for ConcurrentStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ConcurrentStack<T> {
    fn drop(&mut self) {
        // Unlink iteratively so deep stacks do not recurse on drop.
        let mut cursor = self.head.lock().take();
        while let Some(mut node) = cursor {
            cursor = node.next.take();
        }
    }
}

impl<T> std::fmt::Debug for ConcurrentStack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentStack").finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_lifo_order() {
        let stack = ConcurrentStack::new();
        stack.push(1);
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_is_empty() {
        let stack = ConcurrentStack::new();
        assert!(stack.is_empty());
        stack.push("x");
        assert!(!stack.is_empty());
    }

    #[test]
    fn test_concurrent_push_pop_conserves_items() {
        let stack = Arc::new(ConcurrentStack::new());
        let mut handles = Vec::new();

        for t in 0..8 {
            let stack = Arc::clone(&stack);
            handles.push(thread::spawn(move || {
                let mut popped = 0usize;
                for i in 0..200 {
                    stack.push(t * 1000 + i);
                    if i % 2 == 0 && stack.pop().is_some() {
                        popped += 1;
                    }
                }
                popped
            }));
        }

        let popped: usize = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();

        let mut remaining = 0usize;
        while stack.pop().is_some() {
            remaining += 1;
        }
        assert_eq!(popped + remaining, 1600);
    }

    #[test]
    fn test_deep_stack_drop() {
        let stack = ConcurrentStack::new();
        for i in 0..100_000 {
            stack.push(i);
        }
        drop(stack);
    }
}
