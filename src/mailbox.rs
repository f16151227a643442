/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Blocking bounded-plus-overflow FIFO used as each actor's inbox.
//!
//! The mailbox is a ring buffer of fixed capacity backed by an unbounded
//! overflow queue. The ring is the cache-friendly common path; the
//! overflow absorbs bursts without ever stalling producers. Total FIFO
//! order is preserved by the push rule: once anything sits in the
//! overflow, every subsequent push lands behind it, and the overflow is
//! only drained after the ring empties.
//!
//! `push` is infallible and non-blocking. `pop` blocks on a condition
//! variable until an item is available; cancellation is signalled
//! exclusively by enqueuing a `Shutdown` message, never by closing the
//! queue.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Ring capacity used for actor inboxes.
pub const RING_CAPACITY: usize = 64;

/// A blocking multi-producer / single-consumer FIFO.
pub struct Mailbox<T> {
    inner: Mutex<Shelves<T>>,
    available: Condvar,
}

struct Shelves<T> {
    ring: VecDeque<T>,
    overflow: VecDeque<T>,
    capacity: usize,
}

impl<T> Mailbox<T> {
    /// Creates a mailbox whose ring holds `capacity` items before spilling
    /// into the overflow queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Shelves {
                ring: VecDeque::with_capacity(capacity),
                overflow: VecDeque::new(),
                capacity,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues an item. Never blocks.
    ///
    /// Ordering across concurrent producers is the serialization imposed
    /// by the mailbox mutex.
    pub fn push(&self, item: T) {
        {
            let mut shelves = self.inner.lock();
            if !shelves.overflow.is_empty() || shelves.ring.len() == shelves.capacity {
                shelves.overflow.push_back(item);
            } else {
                shelves.ring.push_back(item);
            }
        }
        self.available.notify_one();
    }

    /// Dequeues the next item, blocking until one is available.
    ///
    /// The returned flag is `true` when both sub-queues were left empty by
    /// this pop, i.e. the item was the last one queued at that instant.
    pub fn pop(&self) -> (T, bool) {
        let mut shelves = self.inner.lock();
        let item = loop {
            if let Some(item) = shelves.ring.pop_front() {
                break item;
            }
            if let Some(item) = shelves.overflow.pop_front() {
                break item;
            }
            self.available.wait(&mut shelves);
        };
        let last = shelves.ring.is_empty() && shelves.overflow.is_empty();
        (item, last)
    }

    /// Total number of queued items across ring and overflow.
    pub fn len(&self) -> usize {
        let shelves = self.inner.lock();
        shelves.ring.len() + shelves.overflow.len()
    }

    /// Returns `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        let shelves = self.inner.lock();
        shelves.ring.is_empty() && shelves.overflow.is_empty()
    }

    /// Observes the front of the queue without dequeuing.
    ///
    /// The closure receives `None` when the mailbox is empty. Items cannot
    /// escape the closure because the mailbox lock is held for its
    /// duration.
    pub fn peek<R>(&self, observe: impl FnOnce(Option<&T>) -> R) -> R {
        let shelves = self.inner.lock();
        observe(shelves.ring.front().or_else(|| shelves.overflow.front()))
    }
}
