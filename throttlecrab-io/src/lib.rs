//! # ThrottleCrab IO
//!
//! Byte-rate throttling for readers and writers, with budgets that can be
//! shared across every stream presenting the same key.
//!
//! ## Overview
//!
//! Each throttled stream charges the bytes it actually moves against a
//! [`Rater`], which tracks the earliest instant at which the next transfer may
//! proceed. Streams that present the same key to a [`RateController`] share a
//! rater, so a group of connections for "this tenant" is capped at one
//! aggregate rate rather than one rate per connection.
//!
//! ## Quick Start
//!
//! ```
//! use std::io::Read;
//! use throttlecrab_io::{RateLimit, ThrottledReader};
//!
//! let source = vec![0u8; 64 * 1024];
//!
//! // Read at most 16 MiB per second, on a budget shared by every reader keyed "user:123"
//! let mut reader = ThrottledReader::sleep(&source[..], RateLimit::mib_per_sec(16), "user:123");
//!
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out)?;
//! assert_eq!(out.len(), source.len());
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Policies
//!
//! ### [`Policy::Sleep`]
//! Performs every transfer, then suspends the caller until the debt for the
//! bytes moved is paid. Nothing is ever rejected.
//!
//! ### [`Policy::Discard`]
//! Refuses transfers while the debt owed exceeds the shared clock's refresh
//! interval. Refusals move no bytes, record no debt and surface as
//! [`Discarded`] (or, through `std::io`, as a `WouldBlock` error recognised by
//! [`is_discarded`]).
//!
//! ```
//! use std::io::Write;
//! use throttlecrab_io::{RateLimit, ThrottledWriter, is_discarded};
//!
//! let mut writer = ThrottledWriter::discard(Vec::new(), RateLimit::bytes_per_sec(100), "");
//!
//! // Admitted: the budget was not overdrawn yet
//! assert_eq!(writer.write(&[0u8; 100])?, 100);
//!
//! // Refused: one second of debt is still owed
//! let err = writer.write(&[0u8; 100]).unwrap_err();
//! assert!(is_discarded(&err));
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Duplex Streams
//!
//! [`ThrottledConn`] limits the read and write sides of a connection
//! independently, each with its own rate and key.
//!
//! ## Unlimited Rates
//!
//! A rate of zero or below means unlimited: the wrapper holds no throttle and
//! forwards every call to the inner stream untouched.
//!
//! ## Features
//!
//! - `ahash` (default): Use AHash for the key registry
//! - `tokio` (default): [`AsyncThrottledReader`] and [`AsyncThrottledWriter`]

pub mod core;
pub mod io;

pub use crate::core::{
    Discarded, ParsePolicyError, ParseRateError, Policy, Progress, RateController,
    RateControllerBuilder, RateLimit, Rater, Throttle, clock, is_discarded,
};
pub use crate::io::{ThrottledConn, ThrottledReader, ThrottledWriter};
#[cfg(feature = "tokio")]
pub use crate::io::{AsyncThrottledReader, AsyncThrottledWriter};
