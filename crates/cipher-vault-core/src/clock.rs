//! Time sources.
//!
//! Grant expiry is decided against a clock reading taken at check time, so
//! the clock is injected rather than read ad hoc.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::types::Timestamp;

/// A source of the current time in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock anchored, monotonic clock.
///
/// Reads the system time once at construction and advances it by a
/// monotonic [`Instant`], so readings never go backwards even if the
/// system clock is adjusted.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_secs: Timestamp,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let anchor_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            anchor_secs,
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.anchor_secs + self.anchor.elapsed().as_secs()
    }
}

/// A clock that only moves when told to. Used to simulate elapsed time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute time. Refuses to go backwards.
    pub fn set(&self, to: Timestamp) {
        self.now.fetch_max(to, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
