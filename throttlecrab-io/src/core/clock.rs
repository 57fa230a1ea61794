//! Process-wide cached clock
//!
//! Every throttled transfer needs the current time, possibly from many threads
//! at once. Pacing decisions only need ~100ms granularity, so instead of
//! calling [`Instant::now`] per chunk the raters read a sample that a single
//! background thread refreshes every [`REFRESH_INTERVAL`].
//!
//! The refresher starts lazily on first use and runs for the lifetime of the
//! process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// How often the cached sample is refreshed
///
/// This is also the upper bound on how stale [`now`] can be.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

const THREAD_NAME: &str = "throttlecrab-io-clock";

static CLOCK: OnceLock<Arc<CachedClock>> = OnceLock::new();

struct CachedClock {
    origin: Instant,
    // Nanoseconds since `origin` at the last refresh
    offset_nanos: AtomicU64,
    // False if the refresher thread could not be spawned
    refreshing: bool,
}

impl CachedClock {
    fn start() -> Arc<Self> {
        let origin = Instant::now();
        let spawn = |clock: Arc<CachedClock>| {
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || clock.refresh_forever())
        };

        let clock = Arc::new(CachedClock {
            origin,
            offset_nanos: AtomicU64::new(0),
            refreshing: true,
        });

        match spawn(Arc::clone(&clock)) {
            Ok(_) => {
                tracing::debug!(
                    "Started shared clock refresher every {:?}",
                    REFRESH_INTERVAL
                );
                clock
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to spawn clock refresher, reading the system clock directly: {}",
                    e
                );
                Arc::new(CachedClock {
                    origin,
                    offset_nanos: AtomicU64::new(0),
                    refreshing: false,
                })
            }
        }
    }

    fn refresh_forever(&self) {
        loop {
            thread::sleep(REFRESH_INTERVAL);
            self.offset_nanos
                .store(self.elapsed_nanos(), Ordering::Release);
        }
    }

    fn elapsed_nanos(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn now(&self) -> Instant {
        if !self.refreshing {
            return Instant::now();
        }
        self.origin + Duration::from_nanos(self.offset_nanos.load(Ordering::Acquire))
    }
}

fn clock() -> &'static CachedClock {
    CLOCK.get_or_init(CachedClock::start)
}

/// Returns the most recently cached time sample
///
/// The value trails the real clock by at most [`REFRESH_INTERVAL`] and never
/// goes backwards. The first call in the process starts the refresher.
///
/// # Example
///
/// ```
/// use throttlecrab_io::clock;
///
/// let earlier = clock::now();
/// std::thread::sleep(clock::REFRESH_INTERVAL * 3);
/// assert!(clock::now() > earlier);
/// ```
pub fn now() -> Instant {
    clock().now()
}

/// Starts the background refresher if it is not running yet
///
/// Idempotent: however many callers race here, one thread is spawned.
pub fn ensure_started() {
    clock();
}
