use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// An instant, in whole seconds since the Unix epoch.
///
/// This matches the `uint64` timestamps the voting contract stores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `self` until `later`, or zero if `later` is not after `self`.
    pub const fn saturating_secs_until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }

    /// Adds `secs`, saturating at `u64::MAX`.
    pub const fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Subtracts `secs`, saturating at the epoch.
    pub const fn saturating_sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source of the current instant.
///
/// Status and countdowns are always computed against a `Clock`, never against
/// a cached value, so tests can pin time with [`ManualClock`].
pub trait Clock: Send + Sync + 'static {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            // A clock set before 1970 is treated as the epoch.
            .unwrap_or_default();
        Timestamp(secs)
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now.as_secs())),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now.as_secs(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(Timestamp::from_secs(10));
        let other = clock.clone();
        clock.advance(5);
        assert_eq!(other.now(), Timestamp::from_secs(15));
        other.set(Timestamp::from_secs(1));
        assert_eq!(clock.now(), Timestamp::from_secs(1));
    }

    #[test]
    fn saturating_math() {
        let t = Timestamp::from_secs(100);
        assert_eq!(t.saturating_secs_until(Timestamp::from_secs(160)), 60);
        assert_eq!(t.saturating_secs_until(Timestamp::from_secs(40)), 0);
        assert_eq!(t.saturating_sub_secs(500), Timestamp::from_secs(0));
    }
}
