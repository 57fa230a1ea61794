//! Key registry for shared raters
//!
//! The [`RateController`] maps keys ("this user", "this tenant") to shared
//! [`Rater`]s so that every stream presenting the same key draws from one
//! budget. Streams without a key get a private rater of their own.

use super::{Policy, RateLimit, Rater, Throttle};
use crate::io::{ThrottledReader, ThrottledWriter};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

#[cfg(test)]
mod tests;

// Configuration constants
const DEFAULT_CAPACITY: usize = 64;
const CAPACITY_OVERHEAD_FACTOR: f64 = 1.3;
const DEFAULT_IDLE_CREDIT: Duration = Duration::from_secs(1);

static GLOBAL: OnceLock<Arc<RateController>> = OnceLock::new();

/// Registry of shared raters, keyed by string
///
/// Keyed raters are created lazily on first use and live as long as the
/// controller. Callers generating many short-lived keys should expect the
/// registry to grow accordingly.
///
/// # Example
///
/// ```
/// use throttlecrab_io::{RateController, RateLimit};
/// use std::sync::Arc;
///
/// let controller = RateController::new();
/// let rate = RateLimit::kib_per_sec(512);
///
/// // Same key, same rate: one shared rater
/// let a = controller.resolve(rate, "tenant:1");
/// let b = controller.resolve(rate, "tenant:1");
/// assert!(Arc::ptr_eq(&a, &b));
///
/// // Empty key: always private
/// let c = controller.resolve(rate, "");
/// let d = controller.resolve(rate, "");
/// assert!(!Arc::ptr_eq(&c, &d));
/// ```
#[derive(Debug)]
pub struct RateController {
    raters: Mutex<HashMap<String, Arc<Rater>>>,
    idle_credit: Option<Duration>,
}

/// Builder for configuring a RateController
///
/// # Example
///
/// ```
/// use throttlecrab_io::RateController;
/// use std::time::Duration;
///
/// let controller = RateController::builder()
///     .capacity(10_000)
///     .idle_credit(Duration::from_millis(250))
///     .build();
/// ```
#[derive(Debug)]
pub struct RateControllerBuilder {
    capacity: usize,
    idle_credit: Option<Duration>,
}

impl RateController {
    /// Create a new RateController with default configuration
    ///
    /// Raters handed out by it carry a one second idle credit bound.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder for configuring a RateController
    pub fn builder() -> RateControllerBuilder {
        RateControllerBuilder::default()
    }

    fn with_config(capacity: usize, idle_credit: Option<Duration>) -> Self {
        RateController {
            // Pre-allocate with overhead to avoid rehashing
            raters: Mutex::new(HashMap::with_capacity(
                (capacity as f64 * CAPACITY_OVERHEAD_FACTOR) as usize,
            )),
            idle_credit,
        }
    }

    /// The process-wide controller used by the convenience constructors
    ///
    /// Streams built with [`ThrottledReader::sleep`] and friends share keys
    /// through this instance.
    pub fn global() -> Arc<RateController> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(RateController::new())))
    }

    /// The idle credit bound given to new raters
    pub fn idle_credit(&self) -> Option<Duration> {
        self.idle_credit
    }

    /// Number of keyed raters currently registered
    pub fn len(&self) -> usize {
        self.raters.lock().len()
    }

    /// Returns true if no keyed rater has been registered
    pub fn is_empty(&self) -> bool {
        self.raters.lock().is_empty()
    }

    fn make_rater(&self, rate: RateLimit) -> Arc<Rater> {
        Arc::new(Rater::with_idle_credit(rate, self.idle_credit))
    }

    /// Get the rater for `key`, creating it if needed
    ///
    /// - An empty key always yields a fresh, private rater.
    /// - A known key configured with the same rate yields the shared rater.
    /// - An unknown key, or a known key requested with a different rate, gets
    ///   a fresh rater installed in its place. Holders of the previous rater
    ///   keep using it until they resolve the key again.
    pub fn resolve(&self, rate: RateLimit, key: &str) -> Arc<Rater> {
        if key.is_empty() {
            return self.make_rater(rate);
        }

        let mut raters = self.raters.lock();
        match raters.get(key) {
            Some(rater) if rater.rate() == rate => Arc::clone(rater),
            existing => {
                match existing {
                    Some(old) => tracing::debug!(
                        "Replacing rater for key {:?}: {} -> {}",
                        key,
                        old.rate(),
                        rate
                    ),
                    None => tracing::debug!("Creating rater for key {:?} at {}", key, rate),
                }
                let rater = self.make_rater(rate);
                raters.insert(key.to_string(), Arc::clone(&rater));
                rater
            }
        }
    }

    /// Build a throttle for `policy` around the rater for `key`
    ///
    /// Returns `None` for an unlimited rate: such streams must bypass the
    /// rater entirely.
    pub fn throttle(&self, policy: Policy, rate: RateLimit, key: &str) -> Option<Throttle> {
        if rate.is_unlimited() {
            return None;
        }
        Some(Throttle::new(policy, self.resolve(rate, key)))
    }

    /// Wrap `inner` in a reader throttled through this controller
    pub fn reader<R>(
        &self,
        inner: R,
        policy: Policy,
        rate: impl Into<RateLimit>,
        key: &str,
    ) -> ThrottledReader<R> {
        ThrottledReader::new(inner, self.throttle(policy, rate.into(), key))
    }

    /// Wrap `inner` in a writer throttled through this controller
    pub fn writer<W>(
        &self,
        inner: W,
        policy: Policy,
        rate: impl Into<RateLimit>,
        key: &str,
    ) -> ThrottledWriter<W> {
        ThrottledWriter::new(inner, self.throttle(policy, rate.into(), key))
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RateControllerBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            idle_credit: Some(DEFAULT_IDLE_CREDIT),
        }
    }
}

impl RateControllerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of distinct keys
    ///
    /// The registry will allocate 30% more space to reduce hash collisions.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Bound how far a rater's debt base may lag the clock
    ///
    /// After an idle (or below-rate) period a stream may burst through at most
    /// `credit` worth of budget before pacing resumes.
    pub fn idle_credit(mut self, credit: Duration) -> Self {
        self.idle_credit = Some(credit);
        self
    }

    /// Let the debt base lag the clock without bound
    ///
    /// A stream that ran below its rate for a long time may then burst at full
    /// speed until its accumulated slack is used up.
    pub fn unbounded_idle_credit(mut self) -> Self {
        self.idle_credit = None;
        self
    }

    /// Build the RateController with the configured settings
    pub fn build(self) -> RateController {
        RateController::with_config(self.capacity, self.idle_credit)
    }
}
