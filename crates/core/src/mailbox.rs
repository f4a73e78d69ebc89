//! Single-slot handoff between a classification worker and the control loop.
//!
//! Not a queue: a second `post` before `poll` replaces the first value.
//! Callers keep at most one writer outstanding.

use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use tracing::warn;

#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` and marks the mailbox ready. Returns the unconsumed
    /// value it replaced, if any.
    pub fn post(&self, value: T) -> Option<T> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let replaced = slot.replace(value);
        if replaced.is_some() {
            warn!("mailbox overwrote an unconsumed result");
        }
        replaced
    }

    /// Takes the pending value if one is ready. Never waits: if a writer
    /// currently holds the slot this returns `None` and the next poll
    /// picks the value up.
    pub fn poll(&self) -> Option<T> {
        match self.slot.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}
