//! # Reentrancy Guard
//!
//! The execution model is one mutation at a time, but several ledger
//! operations make an external call (token, bridge) in the middle of a
//! multi-step mutation. A collaborator that calls back into the ledger
//! before the first operation finishes would observe — and could extend —
//! half-applied state. The guard makes such nested entry fail immediately
//! instead.
//!
//! RAII: [`ReentrancyLock::enter`] hands back a guard that releases the
//! lock on drop, so every exit path of an operation (including `?`)
//! releases correctly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single-entry lock over the ledger's mutating operations.
#[derive(Clone, Debug, Default)]
pub struct ReentrancyLock {
    entered: Arc<AtomicBool>,
}

impl ReentrancyLock {
    /// A released lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to enter. Returns `None` if an operation is already inside —
    /// the caller rejects with its reentrancy error.
    ///
    /// The returned guard is self-contained (no borrow of the lock), so the
    /// ledger can keep using `&mut self` while holding it.
    pub fn enter(&self) -> Option<ReentrancyGuard> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(ReentrancyGuard {
                entered: Arc::clone(&self.entered),
            })
        } else {
            None
        }
    }
}

/// Releases the lock when dropped.
#[must_use = "dropping the guard immediately releases the lock"]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entry_is_refused() {
        let lock = ReentrancyLock::new();
        let guard = lock.enter().expect("first entry");
        assert!(lock.enter().is_none(), "nested entry must fail");
        drop(guard);
        assert!(lock.enter().is_some(), "released lock re-enters");
    }

    #[test]
    fn guard_releases_on_early_return() {
        let lock = ReentrancyLock::new();
        let attempt = || -> Result<(), ()> {
            let _guard = lock.enter().ok_or(())?;
            Err(()) // bail mid-operation
        };
        assert!(attempt().is_err());
        assert!(lock.enter().is_some(), "guard must release on the error path");
    }
}
