//! Day-granularity time for availability and pricing.
//!
//! The marketplace prices and books whole days. Public operations take Unix
//! timestamps; internally everything is a [`DayIndex`] — the absolute day
//! count since the epoch.

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Absolute day count since the Unix epoch.
pub type DayIndex = i64;

/// Seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// The day containing the given timestamp.
///
/// Euclidean division keeps pre-epoch timestamps on the correct day.
#[must_use]
pub const fn day_index(at: Timestamp) -> DayIndex {
    at.div_euclid(SECONDS_PER_DAY)
}

/// A source of the current time.
///
/// The settlement time guard reads the clock through this seam so tests can
/// move time forward without sleeping.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> Timestamp;

    /// Current day index.
    fn today(&self) -> DayIndex {
        day_index(self.now())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// A manually driven clock for tests.
///
/// Shared handles observe the same time; advancing one advances all.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock starting at the given timestamp.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    /// Set the current timestamp.
    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Advance the clock by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance(days.saturating_mul(SECONDS_PER_DAY));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
