//! Chunked copy loop with refusal back-off
//!
//! Reads at most `chunk_size` bytes at a time and writes each chunk out in
//! full before reading the next. Transfers refused by a discard throttle are
//! retried after the configured back-off and counted; any other error ends
//! the copy.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use throttlecrab_io::is_discarded;

/// Summary of one copy run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CopyStats {
    pub bytes_copied: u64,
    pub read_refusals: u64,
    pub write_refusals: u64,
    pub elapsed_secs: f64,
    pub bytes_per_sec: f64,
}

impl CopyStats {
    fn finish(&mut self, elapsed: Duration) {
        self.elapsed_secs = elapsed.as_secs_f64();
        self.bytes_per_sec = if self.elapsed_secs > 0.0 {
            self.bytes_copied as f64 / self.elapsed_secs
        } else {
            0.0
        };
    }
}

/// Open the copy source, `-` meaning stdin
pub fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open input {path}"))?;
    Ok(Box::new(file))
}

/// Open the copy sink, `-` meaning stdout
pub fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("Failed to create output {path}"))?;
    Ok(Box::new(file))
}

/// Copy everything from `reader` to `writer`
///
/// Refusals (see [`is_discarded`]) sleep for `retry_interval` and retry the
/// same transfer; no bytes are lost or duplicated. The writer is flushed once
/// the reader reports end of stream.
pub fn copy_throttled<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    retry_interval: Duration,
) -> Result<CopyStats>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let start = Instant::now();
    let mut stats = CopyStats::default();
    let mut buf = vec![0u8; chunk_size];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if is_discarded(&e) => {
                stats.read_refusals += 1;
                tracing::debug!("Read refused, retrying in {:?}", retry_interval);
                thread::sleep(retry_interval);
                continue;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read from input"),
        };

        let mut pending = &buf[..n];
        while !pending.is_empty() {
            match writer.write(pending) {
                Ok(0) => {
                    return Err(io::Error::from(io::ErrorKind::WriteZero))
                        .context("Output stopped accepting data");
                }
                Ok(written) => {
                    pending = &pending[written..];
                    stats.bytes_copied += written as u64;
                }
                Err(e) if is_discarded(&e) => {
                    stats.write_refusals += 1;
                    tracing::debug!("Write refused, retrying in {:?}", retry_interval);
                    thread::sleep(retry_interval);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e).context("Failed to write to output"),
            }
        }
    }

    writer.flush().context("Failed to flush output")?;
    stats.finish(start.elapsed());

    Ok(stats)
}
