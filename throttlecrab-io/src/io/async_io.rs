//! Tokio adapters
//!
//! A poll-based transfer cannot hold finished bytes back from its caller, so
//! under [`Policy::Sleep`] the pause owed by one transfer is awaited at the
//! start of the next read, write, flush or shutdown on the same wrapper. The
//! long-run rate is the same as for the blocking wrappers; only the point
//! where the debt is paid moves. [`Policy::Discard`] refusals complete
//! immediately with an error carrying [`Discarded`](crate::Discarded).

use crate::core::{Policy, RateController, RateLimit, Throttle};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Sleep, sleep};

#[derive(Debug, Default)]
struct Pause {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Pause {
    fn owe(&mut self, pause: Duration) {
        if !pause.is_zero() {
            self.sleep = Some(Box::pin(sleep(pause)));
        }
    }

    fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        if let Some(sleep) = self.sleep.as_mut() {
            ready!(sleep.as_mut().poll(cx));
            self.sleep = None;
        }
        Poll::Ready(())
    }
}

/// An [`AsyncRead`] whose reads are throttled by a [`Throttle`]
///
/// # Example
///
/// ```
/// use throttlecrab_io::{AsyncThrottledReader, RateLimit};
/// use tokio::io::AsyncReadExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> std::io::Result<()> {
/// let data = vec![1u8; 1024];
/// let mut reader = AsyncThrottledReader::sleep(&data[..], RateLimit::mib_per_sec(16), "");
///
/// let mut out = Vec::new();
/// reader.read_to_end(&mut out).await?;
/// assert_eq!(out, data);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct AsyncThrottledReader<R> {
    inner: R,
    throttle: Option<Throttle>,
    pause: Pause,
}

impl<R> AsyncThrottledReader<R> {
    /// Wrap `inner`; `None` forwards every read untouched
    pub fn new(inner: R, throttle: Option<Throttle>) -> Self {
        AsyncThrottledReader {
            inner,
            throttle,
            pause: Pause::default(),
        }
    }

    /// Wrap `inner` without throttling
    pub fn passthrough(inner: R) -> Self {
        Self::new(inner, None)
    }

    /// Pace reads to `rate`, sharing the budget of `key` on the global controller
    pub fn sleep(inner: R, rate: impl Into<RateLimit>, key: &str) -> Self {
        let throttle = RateController::global().throttle(Policy::Sleep, rate.into(), key);
        Self::new(inner, throttle)
    }

    /// Refuse reads above `rate`, sharing the budget of `key` on the global controller
    pub fn discard(inner: R, rate: impl Into<RateLimit>, key: &str) -> Self {
        let throttle = RateController::global().throttle(Policy::Discard, rate.into(), key);
        Self::new(inner, throttle)
    }

    /// Returns true if reads go through a throttle
    pub fn is_throttled(&self) -> bool {
        self.throttle.is_some()
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

impl<R: AsyncRead + Unpin> AsyncRead for AsyncThrottledReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let Some(throttle) = &this.throttle else {
            return Pin::new(&mut this.inner).poll_read(cx, buf);
        };

        ready!(this.pause.poll(cx));
        throttle.admit()?;

        let before = buf.filled().len();
        let result = ready!(Pin::new(&mut this.inner).poll_read(cx, buf));
        let moved = match result {
            Ok(()) => buf.filled().len() - before,
            Err(_) => 0,
        };
        this.pause.owe(throttle.record(moved));

        Poll::Ready(result)
    }
}

/// An [`AsyncWrite`] whose writes are throttled by a [`Throttle`]
///
/// Flush and shutdown first wait out any pause still owed, then pass through.
#[derive(Debug)]
pub struct AsyncThrottledWriter<W> {
    inner: W,
    throttle: Option<Throttle>,
    pause: Pause,
}

impl<W> AsyncThrottledWriter<W> {
    /// Wrap `inner`; `None` forwards every write untouched
    pub fn new(inner: W, throttle: Option<Throttle>) -> Self {
        AsyncThrottledWriter {
            inner,
            throttle,
            pause: Pause::default(),
        }
    }

    /// Wrap `inner` without throttling
    pub fn passthrough(inner: W) -> Self {
        Self::new(inner, None)
    }

    /// Pace writes to `rate`, sharing the budget of `key` on the global controller
    pub fn sleep(inner: W, rate: impl Into<RateLimit>, key: &str) -> Self {
        let throttle = RateController::global().throttle(Policy::Sleep, rate.into(), key);
        Self::new(inner, throttle)
    }

    /// Refuse writes above `rate`, sharing the budget of `key` on the global controller
    pub fn discard(inner: W, rate: impl Into<RateLimit>, key: &str) -> Self {
        let throttle = RateController::global().throttle(Policy::Discard, rate.into(), key);
        Self::new(inner, throttle)
    }

    /// Returns true if writes go through a throttle
    pub fn is_throttled(&self) -> bool {
        self.throttle.is_some()
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

impl<W: AsyncWrite + Unpin> AsyncWrite for AsyncThrottledWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let Some(throttle) = &this.throttle else {
            return Pin::new(&mut this.inner).poll_write(cx, buf);
        };

        ready!(this.pause.poll(cx));
        throttle.admit()?;

        let result = ready!(Pin::new(&mut this.inner).poll_write(cx, buf));
        let moved = match &result {
            Ok(n) => *n,
            Err(_) => 0,
        };
        this.pause.owe(throttle.record(moved));

        Poll::Ready(result)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.pause.poll(cx));
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.pause.poll(cx));
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
