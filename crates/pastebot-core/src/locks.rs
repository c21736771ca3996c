//! Per-message workflow locks.
//!
//! At most one upload workflow may run for a given message. The table is a plain
//! set of in-flight message refs; `WorkflowLock` releases its entry on drop so every
//! exit path (early return, error, panic, expired confirmation) frees the message.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use crate::domain::MessageRef;

/// Concurrent set with atomic test-and-set and idempotent removal.
pub trait LockTable: Send + Sync {
    /// Returns `true` if the lock was acquired, `false` if already held.
    fn try_acquire(&self, msg: MessageRef) -> bool;
    /// Releasing an unlocked message is a no-op.
    fn release(&self, msg: MessageRef);
    fn is_locked(&self, msg: MessageRef) -> bool;
}

#[derive(Default)]
pub struct InMemoryLockTable {
    inner: Mutex<HashSet<MessageRef>>,
}

impl InMemoryLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self) -> std::sync::MutexGuard<'_, HashSet<MessageRef>> {
        // A poisoned set is still a valid set; keep serving it.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LockTable for InMemoryLockTable {
    fn try_acquire(&self, msg: MessageRef) -> bool {
        self.set().insert(msg)
    }

    fn release(&self, msg: MessageRef) {
        self.set().remove(&msg);
    }

    fn is_locked(&self, msg: MessageRef) -> bool {
        self.set().contains(&msg)
    }
}

/// Held for the lifetime of one workflow.
pub struct WorkflowLock {
    table: Arc<dyn LockTable>,
    msg: MessageRef,
}

impl WorkflowLock {
    /// `None` when another workflow already owns `msg`.
    pub fn acquire(table: &Arc<dyn LockTable>, msg: MessageRef) -> Option<Self> {
        if !table.try_acquire(msg) {
            return None;
        }
        Some(Self {
            table: Arc::clone(table),
            msg,
        })
    }

    pub fn message(&self) -> MessageRef {
        self.msg
    }
}

impl Drop for WorkflowLock {
    fn drop(&mut self) {
        self.table.release(self.msg);
        tracing::debug!(msg = %self.msg, "released workflow lock");
    }
}

impl std::fmt::Debug for WorkflowLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowLock").field("msg", &self.msg).finish()
    }
}
