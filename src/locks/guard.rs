//! RAII guard for the sweep-in-progress flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Marks a sweep as running for as long as it is alive.
///
/// Only one guard per flag can exist at a time. When dropped, the flag is
/// cleared, also when the sweep bailed out with an error.
#[derive(Debug)]
pub struct SweepGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> SweepGuard<'a> {
    /// Set the flag, or return `None` if another sweep holds it.
    pub(super) fn try_acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
