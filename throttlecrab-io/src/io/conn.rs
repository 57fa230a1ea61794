use crate::core::{Policy, RateController, RateLimit, Throttle};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// A duplex stream with independent read-side and write-side limits
///
/// Each direction resolves its own rater, with its own rate and key. Setting a
/// direction's rate to zero or below swaps in a pass-through for that
/// direction; setting it positive installs a fresh throttle, re-resolving the
/// rater for the new rate and key.
///
/// # Example
///
/// ```no_run
/// use std::net::TcpStream;
/// use throttlecrab_io::{RateLimit, ThrottledConn};
///
/// let stream = TcpStream::connect("127.0.0.1:8080")?;
/// let mut conn = ThrottledConn::new(stream);
///
/// // Downloads for this tenant share 1 MiB/s across all its connections
/// conn.set_read_limit(RateLimit::mib_per_sec(1), "tenant:42");
/// // Uploads are capped per connection
/// conn.set_write_limit(RateLimit::kib_per_sec(256), "");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct ThrottledConn<S> {
    inner: S,
    controller: Arc<RateController>,
    policy: Policy,
    read: Option<Throttle>,
    write: Option<Throttle>,
}

impl<S> ThrottledConn<S> {
    /// Wrap `inner` with both directions unthrottled
    ///
    /// Limits set later resolve their raters on the global controller.
    pub fn new(inner: S) -> Self {
        Self::with_controller(inner, RateController::global())
    }

    /// Wrap `inner`, resolving raters on `controller`
    pub fn with_controller(inner: S, controller: Arc<RateController>) -> Self {
        ThrottledConn {
            inner,
            controller,
            policy: Policy::Sleep,
            read: None,
            write: None,
        }
    }

    /// Use `policy` for limits installed from now on
    ///
    /// Limits that are already installed keep their policy until they are set
    /// again.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Limit reads to `rate`, sharing the budget of `key`
    ///
    /// A non-positive rate disables read throttling.
    pub fn set_read_limit(&mut self, rate: impl Into<RateLimit>, key: &str) {
        self.read = self.controller.throttle(self.policy, rate.into(), key);
    }

    /// Limit writes to `rate`, sharing the budget of `key`
    ///
    /// A non-positive rate disables write throttling.
    pub fn set_write_limit(&mut self, rate: impl Into<RateLimit>, key: &str) {
        self.write = self.controller.throttle(self.policy, rate.into(), key);
    }

    pub fn is_read_throttled(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_write_throttled(&self) -> bool {
        self.write.is_some()
    }

    /// The throttle applied to reads, if any
    pub fn read_throttle(&self) -> Option<&Throttle> {
        self.read.as_ref()
    }

    /// The throttle applied to writes, if any
    pub fn write_throttle(&self) -> Option<&Throttle> {
        self.write.as_ref()
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> Read for ThrottledConn<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        match &self.read {
            None => inner.read(buf),
            Some(throttle) => throttle.apply(|| inner.read(buf))?,
        }
    }
}

impl<S: Write> Write for ThrottledConn<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        match &self.write {
            None => inner.write(buf),
            Some(throttle) => throttle.apply(|| inner.write(buf))?,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
