//! Blocking FIFO with in-flight accounting.
//!
//! Every `enqueue` raises the in-flight counter and every `mark_done` lowers
//! it; `await_drained` parks the caller until the counter is back at zero.
//! The counter covers queued items as well as items a worker is processing.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use engine_logging::engine_error;

struct QueueState<T> {
    items: VecDeque<T>,
    in_flight: usize,
    closed: bool,
}

pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
    drained: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                in_flight: 0,
                closed: false,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Appends an item. Never blocks beyond the internal lock.
    pub fn enqueue(&self, item: T) {
        let mut state = self.lock();
        state.items.push_back(item);
        state.in_flight += 1;
        drop(state);
        self.available.notify_one();
    }

    /// Blocks until an item is available. Returns `None` once the queue is
    /// closed and empty.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Acknowledges one dequeued item.
    pub fn mark_done(&self) {
        let mut state = self.lock();
        match state.in_flight.checked_sub(1) {
            Some(remaining) => {
                state.in_flight = remaining;
                if remaining == 0 {
                    self.drained.notify_all();
                }
            }
            None => engine_error!("mark_done called with nothing in flight; ignoring"),
        }
    }

    /// Blocks until every enqueued item has been acknowledged. Returns at once
    /// when nothing is in flight.
    pub fn await_drained(&self) {
        let mut state = self.lock();
        while state.in_flight > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Wakes every blocked `dequeue`; they return `None` once the backlog is
    /// empty. Items already queued are still handed out.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn pending(&self) -> usize {
        self.lock().items.len()
    }

    // A panicking worker never holds this lock across user code, so the
    // protected state is consistent even when poisoned.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Calls `mark_done` on drop, so an item is acknowledged exactly once even
/// when its processing unwinds.
pub struct DoneGuard<'a, T> {
    queue: &'a WorkQueue<T>,
}

impl<'a, T> DoneGuard<'a, T> {
    pub fn new(queue: &'a WorkQueue<T>) -> Self {
        Self { queue }
    }
}

impl<T> Drop for DoneGuard<'_, T> {
    fn drop(&mut self) {
        self.queue.mark_done();
    }
}
