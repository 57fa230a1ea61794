//! Core components of the throttlecrab-io throttling engine
//!
//! This module contains the fundamental building blocks:
//! - [`clock`]: Process-wide cached clock consulted on every transfer
//! - [`rate`]: Byte-rate ceilings and debt calculation
//! - [`rater`]: Time-debt accounting for one stream or one shared key
//! - [`controller`]: Registry handing out shared raters by key
//! - [`policy`]: Pacing and admission-refusal policies built on a rater

pub mod clock;
pub mod controller;
pub mod policy;
pub mod rate;
pub mod rater;

pub use controller::{RateController, RateControllerBuilder};
pub use policy::{Policy, Progress, Throttle};
pub use rate::RateLimit;
pub use rater::Rater;

use std::io;
use thiserror::Error;

/// A transfer refused by the admission-refusal policy
///
/// Returned by [`Policy::Discard`] when the rater still owes time debt. No
/// bytes were moved and the rater was not charged; callers are expected to
/// retry later or back off.
///
/// # Example
///
/// ```
/// use throttlecrab_io::{Discarded, Policy, RateController, RateLimit};
///
/// let controller = RateController::new();
/// let throttle = controller
///     .throttle(Policy::Discard, RateLimit::bytes_per_sec(1024), "")
///     .unwrap();
///
/// // The first transfer is admitted and charges one second of debt
/// let first: Result<usize, std::io::Error> = throttle.apply(|| Ok(1024)).unwrap();
/// assert_eq!(first.unwrap(), 1024);
///
/// // The next one is refused until the debt is paid
/// let second = throttle.apply(|| Ok::<usize, std::io::Error>(1024));
/// assert!(matches!(second, Err(Discarded)));
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("transfer discarded by rate limiter")]
pub struct Discarded;

impl From<Discarded> for io::Error {
    fn from(discarded: Discarded) -> Self {
        io::Error::new(io::ErrorKind::WouldBlock, discarded)
    }
}

/// Returns true if `err` is a refusal produced by the rate limiter
///
/// I/O errors raised by the wrapped stream, including its own
/// `WouldBlock` errors, are never reported as discards.
pub fn is_discarded(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.downcast_ref::<Discarded>().is_some())
}

/// Errors that can occur when parsing a [`RateLimit`] from text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseRateError {
    /// The input was empty
    #[error("empty rate")]
    Empty,
    /// The numeric part could not be parsed
    #[error("invalid rate value: {0}")]
    InvalidNumber(String),
    /// The unit suffix is not one of K, M, G
    #[error("invalid rate unit: {0}. Valid units are: K, M, G")]
    InvalidUnit(String),
    /// The value does not fit in a 64-bit byte count
    #[error("rate out of range: {0}")]
    Overflow(String),
}

/// Error returned when parsing an unknown [`Policy`] name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid policy: {0}. Valid options are: sleep (or pace), discard (or refuse)")]
pub struct ParsePolicyError(pub String);
