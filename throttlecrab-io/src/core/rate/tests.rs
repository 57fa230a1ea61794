use super::RateLimit;
use crate::core::ParseRateError;
use std::time::Duration;

#[test]
fn test_unit_constructors() {
    assert_eq!(RateLimit::bytes_per_sec(100).as_bytes_per_sec(), 100);
    assert_eq!(RateLimit::kib_per_sec(2).as_bytes_per_sec(), 2048);
    assert_eq!(RateLimit::mib_per_sec(3).as_bytes_per_sec(), 3 * 1024 * 1024);
    assert_eq!(RateLimit::from(42i64).as_bytes_per_sec(), 42);
}

#[test]
fn test_unlimited_rates() {
    assert!(RateLimit::UNLIMITED.is_unlimited());
    assert!(RateLimit::default().is_unlimited());
    assert!(RateLimit::bytes_per_sec(-5).is_unlimited());
    assert!(!RateLimit::bytes_per_sec(1).is_unlimited());
}

#[test]
fn test_debt_is_proportional_to_bytes() {
    let rate = RateLimit::kib_per_sec(512);

    assert_eq!(rate.debt_for(512 * 1024), Duration::from_secs(1));
    assert_eq!(rate.debt_for(1024 * 1024), Duration::from_secs(2));
    assert_eq!(rate.debt_for(64 * 1024), Duration::from_millis(125));
}

#[test]
fn test_debt_has_nanosecond_precision() {
    // 1 byte at 3 B/s is 333_333_333.33ns, truncated
    let rate = RateLimit::bytes_per_sec(3);
    assert_eq!(rate.debt_for(1), Duration::from_nanos(333_333_333));
}

#[test]
fn test_no_debt_for_zero_bytes_or_unlimited() {
    assert_eq!(RateLimit::bytes_per_sec(10).debt_for(0), Duration::ZERO);
    assert_eq!(RateLimit::UNLIMITED.debt_for(1 << 20), Duration::ZERO);
    assert_eq!(RateLimit::bytes_per_sec(-10).debt_for(1 << 20), Duration::ZERO);
}

#[test]
fn test_huge_debt_saturates() {
    let rate = RateLimit::bytes_per_sec(1);
    assert_eq!(rate.debt_for(usize::MAX), Duration::from_nanos(u64::MAX));
}

#[test]
fn test_parse_plain_and_suffixed() {
    assert_eq!("4096".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 4096);
    assert_eq!("512K".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 512 * 1024);
    assert_eq!("512kib".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 512 * 1024);
    assert_eq!("10M".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 10 * 1024 * 1024);
    assert_eq!("1GB".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 1 << 30);
    assert_eq!(" 7b ".parse::<RateLimit>().unwrap().as_bytes_per_sec(), 7);
}

#[test]
fn test_parse_zero_and_negative_are_unlimited() {
    assert!("0".parse::<RateLimit>().unwrap().is_unlimited());
    assert!("-1".parse::<RateLimit>().unwrap().is_unlimited());
    assert!("-4M".parse::<RateLimit>().unwrap().is_unlimited());
}

#[test]
fn test_parse_errors() {
    assert_eq!("".parse::<RateLimit>(), Err(ParseRateError::Empty));
    assert!(matches!(
        "K".parse::<RateLimit>(),
        Err(ParseRateError::InvalidNumber(_))
    ));
    assert!(matches!(
        "10X".parse::<RateLimit>(),
        Err(ParseRateError::InvalidUnit(_))
    ));
    assert!(matches!(
        "9223372036854775807G".parse::<RateLimit>(),
        Err(ParseRateError::Overflow(_))
    ));
}

#[test]
fn test_display() {
    assert_eq!(RateLimit::bytes_per_sec(100).to_string(), "100 B/s");
    assert_eq!(RateLimit::UNLIMITED.to_string(), "unlimited");
}
