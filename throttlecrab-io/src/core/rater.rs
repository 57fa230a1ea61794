//! Time-debt accounting for throttled streams
//!
//! A [`Rater`] remembers the earliest instant at which its holder may transfer
//! again without owing time. Every completed transfer pushes that instant
//! forward by `bytes / rate`; a caller that asks before the instant is told how
//! long it still has to wait. Under constant load the holder therefore moves
//! exactly `rate` bytes per second on average, whatever its chunk sizes.

use super::{RateLimit, clock};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Per-key (or per-stream) rate tracker
///
/// Raters are shared through `Arc` by every stream presenting the same key to
/// a [`RateController`](super::RateController), which turns their individual
/// transfers into one aggregate cap. All mutation happens under an internal
/// lock, so a `Rater` can be used from many threads at once.
///
/// # Example
///
/// ```
/// use throttlecrab_io::{RateLimit, Rater};
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let rater = Rater::starting_at(RateLimit::bytes_per_sec(1000), None, start);
///
/// rater.record_transfer_at(500, start);
/// assert_eq!(rater.wait_time_at(start), Duration::from_millis(500));
/// assert_eq!(rater.wait_time_at(start + Duration::from_secs(1)), Duration::ZERO);
/// ```
#[derive(Debug)]
pub struct Rater {
    rate: RateLimit,
    idle_credit: Option<Duration>,
    available_at: Mutex<Instant>,
}

impl Rater {
    /// Create a rater with no initial debt and unbounded idle credit
    ///
    /// Starts the shared clock if it is not running yet.
    pub fn new(rate: RateLimit) -> Self {
        Self::with_idle_credit(rate, None)
    }

    /// Create a rater with no initial debt and the given idle credit bound
    ///
    /// With `Some(bound)`, recording a transfer never lets the debt base lag
    /// the clock by more than `bound`, so a stream that was idle (or slow) for
    /// a long time gets at most `bound` worth of unthrottled burst afterwards.
    pub fn with_idle_credit(rate: RateLimit, idle_credit: Option<Duration>) -> Self {
        Self::starting_at(rate, idle_credit, clock::now())
    }

    /// Create a rater that becomes available at `now`
    pub fn starting_at(rate: RateLimit, idle_credit: Option<Duration>, now: Instant) -> Self {
        Rater {
            rate,
            idle_credit,
            available_at: Mutex::new(now),
        }
    }

    /// The rate this rater was created with
    pub fn rate(&self) -> RateLimit {
        self.rate
    }

    /// The idle credit bound this rater was created with
    pub fn idle_credit(&self) -> Option<Duration> {
        self.idle_credit
    }

    /// The earliest instant at which the holder owes no time debt
    pub fn available_at(&self) -> Instant {
        *self.available_at.lock()
    }

    /// Charge the debt for `n` bytes that were actually moved
    ///
    /// Does nothing for `n == 0` or an unlimited rate.
    pub fn record_transfer(&self, n: usize) {
        if n == 0 || self.rate.is_unlimited() {
            return;
        }
        self.charge(n, self.idle_credit.map(|_| clock::now()));
    }

    /// Charge the debt for `n` bytes, using `now` for the idle credit bound
    pub fn record_transfer_at(&self, n: usize, now: Instant) {
        self.charge(n, Some(now));
    }

    fn charge(&self, n: usize, now: Option<Instant>) {
        let debt = self.rate.debt_for(n);
        if debt.is_zero() {
            return;
        }

        let floor = self
            .idle_credit
            .zip(now)
            .and_then(|(credit, now)| now.checked_sub(credit));

        let mut available_at = self.available_at.lock();
        // Only ever moves forward
        let base = match floor {
            Some(floor) => (*available_at).max(floor),
            None => *available_at,
        };
        *available_at = base.checked_add(debt).unwrap_or(base);
    }

    /// How long the holder must still wait before the debt is paid off
    pub fn wait_time(&self) -> Duration {
        self.wait_time_at(clock::now())
    }

    /// How long the holder must still wait, as seen at `now`
    pub fn wait_time_at(&self, now: Instant) -> Duration {
        self.available_at.lock().saturating_duration_since(now)
    }
}
