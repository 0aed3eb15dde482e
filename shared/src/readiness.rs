use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use parking_lot::Mutex;

/// Defers work until the local world/session has finished loading, so that
/// replication traffic never races object construction. Properties queue
/// their go-live transition (and the one bootstrap fetch) on this gate.
pub struct ReadinessGate {
    ready: AtomicBool,
    waiters: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Runs `callback` once the session is ready, immediately if it already
    /// is.
    pub fn when_ready(&self, callback: impl FnOnce() + Send + 'static) {
        if self.is_ready() {
            callback();
            return;
        }
        let mut waiters = self.waiters.lock();
        // readiness may have flipped while acquiring the lock
        if self.is_ready() {
            drop(waiters);
            callback();
            return;
        }
        waiters.push(Box::new(callback));
    }

    /// Marks the session ready and drains queued work. Idempotent.
    pub fn signal_ready(&self) {
        let waiters = {
            let mut waiters = self.waiters.lock();
            if self.ready.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *waiters)
        };

        debug!("session ready, releasing {} deferred task(s)", waiters.len());
        for waiter in waiters {
            waiter();
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
