#![cfg(feature = "tokio")]

use std::time::{Duration, Instant};
use throttlecrab_io::{
    AsyncThrottledReader, AsyncThrottledWriter, Policy, RateController, RateLimit, is_discarded,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const KIB: usize = 1024;

fn assert_within(elapsed: Duration, expected: Duration, tolerance: f64) {
    let low = expected.mul_f64(1.0 - tolerance);
    let high = expected.mul_f64(1.0 + tolerance);
    assert!(
        elapsed >= low && elapsed <= high,
        "elapsed {elapsed:?} outside [{low:?}, {high:?}]"
    );
}

#[tokio::test]
async fn test_async_writer_paces_until_flush() {
    let controller = RateController::new();
    let throttle = controller.throttle(Policy::Sleep, RateLimit::kib_per_sec(128), "");
    let mut writer = AsyncThrottledWriter::new(Vec::new(), throttle);

    let start = Instant::now();
    for _ in 0..16 {
        writer.write_all(&[1u8; 16 * KIB]).await.unwrap();
    }
    // The pause owed by the last write is paid here
    writer.flush().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(writer.get_ref().len(), 256 * KIB);
    assert_within(elapsed, Duration::from_secs(2), 0.10);
}

#[tokio::test]
async fn test_async_reader_paces() {
    let controller = RateController::new();
    let data = vec![9u8; 128 * KIB];
    let throttle = controller.throttle(Policy::Sleep, RateLimit::kib_per_sec(64), "");
    let mut reader = AsyncThrottledReader::new(&data[..], throttle);

    let start = Instant::now();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(out, data);
    assert_within(elapsed, Duration::from_secs(2), 0.10);
}

#[tokio::test]
async fn test_async_discard_refuses_immediately() {
    let controller = RateController::new();
    let throttle = controller.throttle(Policy::Discard, RateLimit::bytes_per_sec(100), "");
    let mut writer = AsyncThrottledWriter::new(Vec::new(), throttle);

    assert_eq!(writer.write(&[0u8; 100]).await.unwrap(), 100);

    let start = Instant::now();
    let err = writer.write(&[0u8; 100]).await.unwrap_err();
    assert!(is_discarded(&err));
    assert!(start.elapsed() < Duration::from_millis(100));

    // Discard owes no pause, so shutdown completes right away
    writer.shutdown().await.unwrap();
    assert_eq!(writer.get_ref().len(), 100);
}

#[tokio::test]
async fn test_async_shared_key_caps_tasks() {
    let controller = RateController::new();
    let rate = RateLimit::kib_per_sec(128);

    let start = Instant::now();
    let mut tasks = Vec::new();
    for _ in 0..2 {
        let throttle = controller.throttle(Policy::Sleep, rate, "tasks");
        tasks.push(tokio::spawn(async move {
            let mut writer = AsyncThrottledWriter::new(tokio::io::sink(), throttle);
            for _ in 0..8 {
                writer.write_all(&[0u8; 16 * KIB]).await.unwrap();
            }
            writer.flush().await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // 256 KiB through one 128 KiB/s budget
    assert_within(start.elapsed(), Duration::from_secs(2), 0.10);
    assert_eq!(controller.len(), 1);
}

#[tokio::test]
async fn test_async_unlimited_is_passthrough() {
    let mut reader = AsyncThrottledReader::sleep(&b"plain bytes"[..], RateLimit::UNLIMITED, "k");
    assert!(!reader.is_throttled());

    let mut out = String::new();
    reader.read_to_string(&mut out).await.unwrap();
    assert_eq!(out, "plain bytes");
}
