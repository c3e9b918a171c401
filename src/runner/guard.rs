//! Single-slot in-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EnvselError, Result};

/// Admits at most one activation at a time.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    busy: AtomicBool,
}

impl InFlightGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or fail with [`EnvselError::ActivationInProgress`]
    /// if it is taken. The slot is released when the returned value drops.
    pub fn try_acquire(&self) -> Result<InFlightSlot<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| EnvselError::ActivationInProgress)?;
        Ok(InFlightSlot { guard: self })
    }

    /// Whether an activation currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// A claimed slot. Dropping it frees the guard.
#[derive(Debug)]
pub struct InFlightSlot<'a> {
    guard: &'a InFlightGuard,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
