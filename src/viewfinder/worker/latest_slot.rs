use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Holds at most one pending item. Publishing over a pending item drops the
/// older one, so a slow consumer always sees the most recent frame.
#[derive(Debug)]
pub struct LatestFrameSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
    dropped: AtomicU64,
}

#[derive(Debug)]
struct SlotState<T> {
    pending: Option<T>,
    closed: bool,
}

impl<T> Default for LatestFrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestFrameSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
            dropped: AtomicU64::new(0),
        }
    }

    // The slot only ever holds a complete value, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `item` as the pending value and returns the one it superseded.
    /// Items published after `close` are discarded.
    pub fn publish(&self, item: T) -> Option<T> {
        let superseded = {
            let mut state = self.lock();
            if state.closed {
                return None;
            }
            state.pending.replace(item)
        };

        if superseded.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.ready.notify_one();
        superseded
    }

    /// Waits up to `timeout` for a pending item and takes it.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        let (mut state, _) = self
            .ready
            .wait_timeout_while(guard, timeout, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        state.pending.take()
    }

    pub fn try_take(&self) -> Option<T> {
        self.lock().pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Rejects further items and wakes any waiting consumer.
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items superseded before a consumer took them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
