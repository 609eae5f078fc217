//! Single-item, overwrite-on-write mailbox for the next utterance.
//!
//! Holds at most one pending utterance. A write replaces whatever is pending,
//! so a slow consumer only ever sees the most recent request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct SpeechSlot {
    pending: Mutex<Option<String>>,
    changed: Condvar,
}

impl SpeechSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending utterance with `text`.
    pub fn write(&self, text: impl Into<String>) {
        let mut pending = self.lock();
        *pending = Some(text.into());
        self.changed.notify_one();
    }

    /// Take the pending utterance, leaving the slot empty.
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Block until an utterance is pending or `running` reads false.
    ///
    /// `running` is checked before taking, so an utterance written after a
    /// stop stays buffered for the next run. Returns `None` once `running` is
    /// false.
    pub fn wait_take(&self, running: &AtomicBool) -> Option<String> {
        let mut pending = self.lock();
        loop {
            if !running.load(Ordering::Acquire) {
                return None;
            }
            if let Some(text) = pending.take() {
                return Some(text);
            }
            pending = self
                .changed
                .wait(pending)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Wake a consumer blocked in [`wait_take`](Self::wait_take).
    ///
    /// Takes the lock first so the notification cannot fall between the
    /// consumer's flag check and its wait.
    pub fn wake(&self) {
        let _pending = self.lock();
        self.changed.notify_all();
    }

    // A panicking writer cannot leave the Option half-written.
    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
