//! Blocking FIFO queue with identifier lookup and a finished state.
//!
//! All operations serialize on one mutex. Blocking calls wait on a condition
//! variable and re-check their predicate after every wakeup, so a `finish()`
//! issued before a waiter arrives is never missed.
//!
//! # Example
//!
//! ```
//! use stagecache::queue::{Message, WaitingQueue};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(WaitingQueue::new());
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for n in 0..3 {
//!             queue.put(Message::new(n, 0, ""));
//!         }
//!         queue.finish();
//!     })
//! };
//!
//! let mut received = Vec::new();
//! while let Some(message) = queue.pop_or_wait() {
//!     received.push(message.release_data());
//! }
//! producer.join().unwrap();
//! assert_eq!(received, vec![0, 1, 2]);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use super::Message;

#[derive(Debug)]
struct QueueState<T> {
    messages: VecDeque<Message<T>>,
    finished: bool,
}

impl<T> QueueState<T> {
    fn ready(&self) -> bool {
        self.finished || !self.messages.is_empty()
    }

    fn position_of(&self, message_id: &str) -> Option<usize> {
        self.messages
            .iter()
            .position(|message| message.message_id() == message_id)
    }
}

/// Thread-safe blocking queue of [`Message`]s.
#[derive(Debug)]
pub struct WaitingQueue<T> {
    state: Mutex<QueueState<T>>,
    changed: Condvar,
    n_batches: AtomicUsize,
}

impl<T> Default for WaitingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WaitingQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                messages: VecDeque::new(),
                finished: false,
            }),
            changed: Condvar::new(),
            n_batches: AtomicUsize::new(1),
        }
    }

    /// Append an item at the tail and wake all waiters.
    pub fn put(&self, item: Message<T>) {
        self.state.lock().messages.push_back(item);
        self.changed.notify_all();
    }

    /// Mark the queue finished. Idempotent; the flag is never cleared.
    pub fn finish(&self) {
        self.state.lock().finished = true;
        self.changed.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }

    /// Block until an item is available or the queue is finished.
    ///
    /// Returns the head item, or `None` once the queue is finished and empty.
    pub fn pop_or_wait(&self) -> Option<Message<T>> {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |state| !state.ready());
        state.messages.pop_front()
    }

    /// Pop the head item if there is one, without waiting.
    pub fn try_pop(&self) -> Option<Message<T>> {
        self.state.lock().messages.pop_front()
    }

    /// Block until an item with `message_id` is queued or the queue is finished.
    ///
    /// The matching item is removed in place; every other item keeps its
    /// position. Returns `None` if the queue finishes without a match.
    pub fn get_or_wait(&self, message_id: &str) -> Option<Message<T>> {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |state| {
            !state.finished && state.position_of(message_id).is_none()
        });
        let position = state.position_of(message_id)?;
        state.messages.remove(position)
    }

    /// Block until the queue is finished, then drain every item in order.
    pub fn get_all_or_wait(&self) -> Vec<Message<T>> {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |state| !state.finished);
        state.messages.drain(..).collect()
    }

    /// Block until an item is available or the queue is finished.
    ///
    /// Returns whether an item is available. Nothing is consumed.
    pub fn wait_for_next(&self) -> bool {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |state| !state.ready());
        !state.messages.is_empty()
    }

    /// Whether an item is available right now.
    pub fn has_next_now(&self) -> bool {
        !self.state.lock().messages.is_empty()
    }

    /// Block until an item is available or the queue is finished, then report
    /// whether more work is still possible (the queue is not finished).
    pub fn ready_to_execute(&self) -> bool {
        let mut state = self.state.lock();
        self.changed.wait_while(&mut state, |state| !state.ready());
        !state.finished
    }

    /// Remove and drop every queued item. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let drained: Vec<Message<T>> = self.state.lock().messages.drain(..).collect();
        // Payloads drop outside the lock; spill files are removed here.
        drained.len()
    }

    /// Record how many batches a consumer should expect. Advisory only.
    pub fn set_number_of_batches(&self, n_batches: usize) {
        self.n_batches.store(n_batches, Ordering::SeqCst);
    }

    pub fn number_of_batches(&self) -> usize {
        self.n_batches.load(Ordering::SeqCst)
    }
}
