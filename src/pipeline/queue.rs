//! Lock-protected FIFO shared between the pipeline stages
//!
//! Every operation takes the same mutex, so the length and the lifetime
//! enqueue/dequeue totals always agree with each other.

use std::collections::VecDeque;

use parking_lot::Mutex;

/// Point-in-time view of a queue, taken under one lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub len: usize,
    pub enqueued: u64,
    pub dequeued: u64,
}

struct Inner<T> {
    items: VecDeque<T>,
    enqueued: u64,
    dequeued: u64,
}

/// Thread-safe unbounded FIFO
pub struct SafeQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> SafeQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                enqueued: 0,
                dequeued: 0,
            }),
        }
    }

    /// Append an item to the tail
    pub fn enqueue(&self, item: T) {
        let mut inner = self.inner.lock();
        inner.items.push_back(item);
        inner.enqueued += 1;
    }

    /// Remove the head, or `None` if the queue is empty
    pub fn dequeue(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let item = inner.items.pop_front();
        if item.is_some() {
            inner.dequeued += 1;
        }
        item
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        QueueStats {
            len: inner.items.len(),
            enqueued: inner.enqueued,
            dequeued: inner.dequeued,
        }
    }
}

impl<T> Default for SafeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
