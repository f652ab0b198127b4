//! Global admission control.
//!
//! One stage may be in flight at a time across all projects. The gate is a
//! single-permit semaphore with try-acquire semantics: a caller that cannot
//! get the slot is told so immediately (the API surfaces `Busy`), it is
//! never queued. No fairness or FIFO is promised.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Process-wide single-slot admission gate.
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

/// Held while a stage is in flight; dropping it releases the gate.
pub struct StageSlot {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Try to take the slot. Returns `None` when another stage holds it.
    pub fn try_acquire(&self) -> Option<StageSlot> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Some(StageSlot { _permit: permit }),
            Err(TryAcquireError::NoPermits) => None,
            // The semaphore is never closed
            Err(TryAcquireError::Closed) => None,
        }
    }

    /// Check availability without acquiring.
    pub fn is_free(&self) -> bool {
        self.semaphore.available_permits() > 0
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_denied_while_held() {
        let gate = ConcurrencyGate::new();

        let slot = gate.try_acquire();
        assert!(slot.is_some());
        assert!(gate.try_acquire().is_none());
        assert!(!gate.is_free());
    }

    #[test]
    fn test_drop_releases_the_slot() {
        let gate = ConcurrencyGate::new();

        let slot = gate.try_acquire().unwrap();
        drop(slot);

        assert!(gate.is_free());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let gate = ConcurrencyGate::new();
        let other = gate.clone();

        let _slot = gate.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }
}
