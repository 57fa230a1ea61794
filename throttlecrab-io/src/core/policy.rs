//! Throttling policies built on a [`Rater`]
//!
//! Two policies share the same accounting but differ in when they consult it:
//!
//! - [`Policy::Sleep`] always performs the transfer, charges the bytes moved,
//!   then suspends the caller until the debt is paid. Data is never rejected.
//! - [`Policy::Discard`] checks the debt first and refuses the transfer with
//!   [`Discarded`] while more than [`REFRESH_INTERVAL`] of it is owed. It
//!   never blocks.
//!
//! The shared clock may trail real time by up to one refresh interval, so a
//! debt of at most that much cannot be told apart from no debt at all. Discard
//! admits within that margin; otherwise a cold rater would refuse offers that
//! are well below its rate.
//!
//! Checking before the transfer means every admitted transfer is charged
//! against a budget that was not yet overdrawn, and every refusal costs the
//! caller nothing: no bytes moved, no debt recorded.

use super::clock::REFRESH_INTERVAL;
use super::{Discarded, ParsePolicyError, Rater};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How a throttle reacts to a rater that still owes time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Transfer first, then sleep off the debt
    #[default]
    Sleep,
    /// Refuse transfers while debt is owed beyond the clock's resolution
    Discard,
}

/// Accepts `sleep` (alias `pace`) and `discard` (alias `refuse`), in any case
impl FromStr for Policy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sleep" | "pace" => Ok(Policy::Sleep),
            "discard" | "refuse" => Ok(Policy::Discard),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Sleep => write!(f, "sleep"),
            Policy::Discard => write!(f, "discard"),
        }
    }
}

/// Outcome of one bounded transfer
///
/// Tells the throttle how many bytes were actually moved so it can charge
/// them, whatever else the outcome carries.
pub trait Progress {
    /// Bytes moved by the transfer
    fn bytes_moved(&self) -> usize;
}

/// `Ok(n)` moved `n` bytes; an error moved nothing
impl<E> Progress for Result<usize, E> {
    fn bytes_moved(&self) -> usize {
        match self {
            Ok(n) => *n,
            Err(_) => 0,
        }
    }
}

/// Partial progress followed by an optional failure
impl<E> Progress for (usize, Option<E>) {
    fn bytes_moved(&self) -> usize {
        self.0
    }
}

/// A policy bound to the rater it charges
///
/// Cloning is cheap and clones share the rater.
///
/// # Example
///
/// ```
/// use throttlecrab_io::{Policy, Rater, RateLimit, Throttle};
/// use std::sync::Arc;
///
/// let rater = Arc::new(Rater::new(RateLimit::mib_per_sec(100)));
/// let throttle = Throttle::new(Policy::Sleep, rater);
///
/// // A partial transfer that failed after moving 3 bytes: both halves survive
/// let (n, err) = throttle
///     .apply(|| (3usize, Some("connection reset")))
///     .unwrap();
/// assert_eq!(n, 3);
/// assert_eq!(err, Some("connection reset"));
/// ```
#[derive(Debug, Clone)]
pub struct Throttle {
    policy: Policy,
    rater: Arc<Rater>,
}

impl Throttle {
    /// Bind `policy` to `rater`
    pub fn new(policy: Policy, rater: Arc<Rater>) -> Self {
        Throttle { policy, rater }
    }

    /// The policy of this throttle
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The rater this throttle charges
    pub fn rater(&self) -> &Arc<Rater> {
        &self.rater
    }

    /// Decide whether a transfer may start now
    ///
    /// Always admits under [`Policy::Sleep`]. Under [`Policy::Discard`] the
    /// transfer is refused while the rater owes more than [`REFRESH_INTERVAL`].
    pub fn admit(&self) -> Result<(), Discarded> {
        match self.policy {
            Policy::Sleep => Ok(()),
            Policy::Discard if self.rater.wait_time() <= REFRESH_INTERVAL => Ok(()),
            Policy::Discard => Err(Discarded),
        }
    }

    /// Charge `n` moved bytes and return the pause the caller now owes
    ///
    /// Only [`Policy::Sleep`] asks for a pause, and never after a transfer
    /// that moved nothing.
    pub fn record(&self, n: usize) -> Duration {
        self.rater.record_transfer(n);
        match self.policy {
            Policy::Sleep if n > 0 => self.rater.wait_time(),
            _ => Duration::ZERO,
        }
    }

    /// Charge `n` moved bytes and block the current thread for the pause owed
    pub fn settle(&self, n: usize) {
        let pause = self.record(n);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    /// Run one transfer under this throttle
    ///
    /// Returns [`Discarded`] without calling `op` if admission is refused.
    /// Otherwise `op` runs once, its outcome is charged by the bytes it
    /// reports, and the outcome is returned unchanged.
    pub fn apply<T, F>(&self, op: F) -> Result<T, Discarded>
    where
        T: Progress,
        F: FnOnce() -> T,
    {
        self.admit()?;
        let outcome = op();
        self.settle(outcome.bytes_moved());
        Ok(outcome)
    }
}
