//! Throttled stream wrappers
//!
//! The wrappers keep the shape of the stream they wrap: a read or write moves
//! at most `buf.len()` bytes and reports how many it moved. A wrapper built
//! with an unlimited rate holds no throttle and forwards every call untouched.

mod conn;
#[cfg(feature = "tokio")]
mod async_io;

pub use conn::ThrottledConn;
#[cfg(feature = "tokio")]
pub use async_io::{AsyncThrottledReader, AsyncThrottledWriter};

use crate::core::{Policy, RateController, RateLimit, Throttle};
use std::io::{self, Read, Write};

/// A reader whose reads are throttled by a [`Throttle`]
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use throttlecrab_io::{RateLimit, ThrottledReader};
///
/// let data = vec![7u8; 4096];
/// // Unlimited rate: reads go straight through
/// let mut reader = ThrottledReader::sleep(&data[..], RateLimit::UNLIMITED, "");
/// assert!(!reader.is_throttled());
///
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).unwrap();
/// assert_eq!(out, data);
/// ```
#[derive(Debug)]
pub struct ThrottledReader<R> {
    inner: R,
    throttle: Option<Throttle>,
}

impl<R> ThrottledReader<R> {
    /// Wrap `inner`; `None` forwards every read untouched
    pub fn new(inner: R, throttle: Option<Throttle>) -> Self {
        ThrottledReader { inner, throttle }
    }

    /// Wrap `inner` without throttling
    pub fn passthrough(inner: R) -> Self {
        Self::new(inner, None)
    }

    /// Pace reads to `rate`, sharing the budget of `key` on the global controller
    pub fn sleep(inner: R, rate: impl Into<RateLimit>, key: &str) -> Self {
        RateController::global().reader(inner, Policy::Sleep, rate, key)
    }

    /// Refuse reads above `rate`, sharing the budget of `key` on the global controller
    pub fn discard(inner: R, rate: impl Into<RateLimit>, key: &str) -> Self {
        RateController::global().reader(inner, Policy::Discard, rate, key)
    }

    /// Returns true if reads go through a throttle
    pub fn is_throttled(&self) -> bool {
        self.throttle.is_some()
    }

    /// The throttle applied to reads, if any
    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ThrottledReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        match &self.throttle {
            None => inner.read(buf),
            Some(throttle) => throttle.apply(|| inner.read(buf))?,
        }
    }
}

/// A writer whose writes are throttled by a [`Throttle`]
///
/// Flushes are never throttled.
///
/// # Example
///
/// ```
/// use std::io::Write;
/// use throttlecrab_io::{RateLimit, ThrottledWriter};
///
/// let mut writer = ThrottledWriter::sleep(Vec::new(), RateLimit::mib_per_sec(64), "");
/// writer.write_all(b"hello").unwrap();
/// assert_eq!(writer.get_ref(), b"hello");
/// ```
#[derive(Debug)]
pub struct ThrottledWriter<W> {
    inner: W,
    throttle: Option<Throttle>,
}

impl<W> ThrottledWriter<W> {
    /// Wrap `inner`; `None` forwards every write untouched
    pub fn new(inner: W, throttle: Option<Throttle>) -> Self {
        ThrottledWriter { inner, throttle }
    }

    /// Wrap `inner` without throttling
    pub fn passthrough(inner: W) -> Self {
        Self::new(inner, None)
    }

    /// Pace writes to `rate`, sharing the budget of `key` on the global controller
    pub fn sleep(inner: W, rate: impl Into<RateLimit>, key: &str) -> Self {
        RateController::global().writer(inner, Policy::Sleep, rate, key)
    }

    /// Refuse writes above `rate`, sharing the budget of `key` on the global controller
    pub fn discard(inner: W, rate: impl Into<RateLimit>, key: &str) -> Self {
        RateController::global().writer(inner, Policy::Discard, rate, key)
    }

    /// Returns true if writes go through a throttle
    pub fn is_throttled(&self) -> bool {
        self.throttle.is_some()
    }

    /// The throttle applied to writes, if any
    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ThrottledWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = &mut self.inner;
        match &self.throttle {
            None => inner.write(buf),
            Some(throttle) => throttle.apply(|| inner.write(buf))?,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
