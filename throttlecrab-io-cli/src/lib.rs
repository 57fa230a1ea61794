//! # ThrottleCrab IO
//!
//! A command-line copy tool that moves bytes from a source to a sink at a
//! limited rate, built on the `throttlecrab-io` library.
//!
//! ## Installation
//!
//! ```bash
//! cargo install throttlecrab-io-cli
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Show all available options
//! throttlecrab-io --help
//!
//! # Copy a file at 1 MiB/s
//! throttlecrab-io --input backup.tar --output /mnt/nfs/backup.tar --write-limit 1MiB
//!
//! # Pipe through with a read limit and JSON statistics
//! curl -s https://example.com/big | throttlecrab-io --read-limit 256KiB --stats-json > big
//! ```
//!
//! ## Configuration
//!
//! Configure via CLI arguments or environment variables (CLI takes precedence):
//!
//! ```bash
//! export THROTTLECRAB_IO_WRITE_LIMIT=512KiB
//! export THROTTLECRAB_IO_POLICY=discard
//! throttlecrab-io --input a.bin --output b.bin
//!
//! # List all available environment variables
//! throttlecrab-io --list-env-vars
//! ```
//!
//! ### Key Configuration Options
//!
//! - **Limits**: `--read-limit 2MiB`, `--write-limit 512KiB` (`0` disables)
//! - **Shared budgets**: `--read-key tenant:1`, `--write-key tenant:1`
//! - **Policy**: `--policy sleep|discard`
//! - **Transfer size**: `--chunk-size 32768`
//! - **Log Level**: `--log-level error|warn|info|debug|trace`
//!
//! ## How It Works
//!
//! Every transfer charges the bytes it moved against a rater that tracks
//! when the next transfer may run:
//! - With `sleep`, the copy pauses after each chunk until its debt is paid
//! - With `discard`, a chunk offered too early is refused and retried after
//!   `--retry-interval-ms`; refusals are counted in the run statistics

pub mod config;
pub mod copy;
