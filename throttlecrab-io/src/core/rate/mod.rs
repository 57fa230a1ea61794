//! Byte-rate ceilings for throttled streams
//!
//! This module provides the [`RateLimit`] type which represents a configured
//! ceiling in bytes per second. It converts byte counts into the time debt a
//! stream owes after moving them.

use super::ParseRateError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(test)]
mod tests;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// RateLimit defines how many bytes per second a stream (or key) may move
///
/// A value of zero or below means "unlimited": wrappers configured with such a
/// rate forward every transfer untouched and never consult a rater.
///
/// # Examples
///
/// ```
/// use throttlecrab_io::RateLimit;
/// use std::time::Duration;
///
/// // 512 KiB per second
/// let rate = RateLimit::kib_per_sec(512);
/// assert_eq!(rate.as_bytes_per_sec(), 512 * 1024);
///
/// // Moving 256 KiB owes half a second
/// assert_eq!(rate.debt_for(256 * 1024), Duration::from_millis(500));
///
/// // Non-positive rates disable throttling
/// assert!(RateLimit::bytes_per_sec(0).is_unlimited());
/// assert!(RateLimit::bytes_per_sec(-1).is_unlimited());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RateLimit {
    bytes_per_sec: i64,
}

impl RateLimit {
    /// A rate that never throttles
    pub const UNLIMITED: RateLimit = RateLimit { bytes_per_sec: 0 };

    /// Creates a rate of `n` bytes per second
    ///
    /// # Example
    ///
    /// ```
    /// use throttlecrab_io::RateLimit;
    ///
    /// let rate = RateLimit::bytes_per_sec(64_000);
    /// assert!(!rate.is_unlimited());
    /// ```
    pub const fn bytes_per_sec(n: i64) -> Self {
        RateLimit { bytes_per_sec: n }
    }

    /// Creates a rate of `n` KiB (1024 bytes) per second
    pub const fn kib_per_sec(n: i64) -> Self {
        RateLimit {
            bytes_per_sec: n.saturating_mul(1024),
        }
    }

    /// Creates a rate of `n` MiB per second
    pub const fn mib_per_sec(n: i64) -> Self {
        RateLimit {
            bytes_per_sec: n.saturating_mul(1024 * 1024),
        }
    }

    /// Returns the configured bytes per second
    pub const fn as_bytes_per_sec(&self) -> i64 {
        self.bytes_per_sec
    }

    /// Returns true if this rate disables throttling
    pub const fn is_unlimited(&self) -> bool {
        self.bytes_per_sec <= 0
    }

    /// Returns the time debt owed after moving `bytes` at this rate
    ///
    /// The debt is `bytes / bytes_per_sec` seconds with nanosecond precision.
    /// Zero bytes, or an unlimited rate, owe nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use throttlecrab_io::RateLimit;
    /// use std::time::Duration;
    ///
    /// let rate = RateLimit::bytes_per_sec(1000);
    /// assert_eq!(rate.debt_for(1), Duration::from_millis(1));
    /// assert_eq!(rate.debt_for(0), Duration::ZERO);
    /// ```
    pub fn debt_for(&self, bytes: usize) -> Duration {
        if bytes == 0 || self.is_unlimited() {
            return Duration::ZERO;
        }

        let nanos = bytes as u128 * NANOS_PER_SEC / self.bytes_per_sec as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl From<i64> for RateLimit {
    fn from(bytes_per_sec: i64) -> Self {
        RateLimit::bytes_per_sec(bytes_per_sec)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "unlimited")
        } else {
            write!(f, "{} B/s", self.bytes_per_sec)
        }
    }
}

/// Parses rates such as `"4096"`, `"512K"`, `"10M"`, `"1GiB"`
///
/// Units are binary multiples and case-insensitive; a trailing `B` or `iB` is
/// accepted. Negative values parse successfully and mean unlimited.
impl FromStr for RateLimit {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRateError::Empty);
        }

        let split = s
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let value: i64 = number
            .parse()
            .map_err(|_| ParseRateError::InvalidNumber(number.to_string()))?;

        let multiplier: i64 = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "k" | "kb" | "kib" => 1024,
            "m" | "mb" | "mib" => 1024 * 1024,
            "g" | "gb" | "gib" => 1024 * 1024 * 1024,
            _ => return Err(ParseRateError::InvalidUnit(unit.to_string())),
        };

        value
            .checked_mul(multiplier)
            .map(RateLimit::bytes_per_sec)
            .ok_or_else(|| ParseRateError::Overflow(s.to_string()))
    }
}
