// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host clocks and the session-relative clock.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic millisecond source provided by the host
pub trait HostClock {
    /// Milliseconds since an arbitrary fixed point
    fn now_millis(&self) -> u64;
}

/// Wall-clock backed host clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock anchored at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven host clock for headless hosts and tests.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at 0 ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time
    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Advance the current time
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl HostClock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Elapsed time relative to a recording or playback origin.
///
/// Clones share the origin, so every holder stamps against the same start.
#[derive(Clone)]
pub struct SessionClock {
    host: Arc<dyn HostClock>,
    origin: Arc<Mutex<Option<u64>>>,
}

impl SessionClock {
    /// Create a stopped clock over a host clock
    pub fn new(host: Arc<dyn HostClock>) -> Self {
        Self {
            host,
            origin: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the origin to the current host time
    pub fn start(&self) {
        *self.origin.lock() = Some(self.host.now_millis());
    }

    /// Set the origin so that `elapsed` currently reads `elapsed_millis`
    pub fn start_at(&self, elapsed_millis: u64) {
        let now = self.host.now_millis();
        *self.origin.lock() = Some(now.saturating_sub(elapsed_millis));
    }

    /// Clear the origin
    pub fn reset(&self) {
        *self.origin.lock() = None;
    }

    /// Whether an origin is set
    pub fn is_running(&self) -> bool {
        self.origin.lock().is_some()
    }

    /// Milliseconds since the origin, 0 when stopped
    pub fn elapsed(&self) -> u64 {
        match *self.origin.lock() {
            Some(origin) => self.host.now_millis().saturating_sub(origin),
            None => 0,
        }
    }

    /// Current host time
    pub fn host_now(&self) -> u64 {
        self.host.now_millis()
    }
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("origin", &*self.origin.lock())
            .finish_non_exhaustive()
    }
}
