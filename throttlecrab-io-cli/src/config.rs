//! Copy tool configuration and CLI argument parsing
//!
//! Every option can be given on the command line or through an environment
//! variable with the `THROTTLECRAB_IO_` prefix.
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Pace a download to 2 MiB/s
//! throttlecrab-io --input big.iso --output copy.iso --read-limit 2MiB
//!
//! # Using environment variables
//! export THROTTLECRAB_IO_WRITE_LIMIT=512KiB
//! export THROTTLECRAB_IO_POLICY=discard
//! cat big.iso | throttlecrab-io > copy.iso
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;
use std::time::Duration;
use throttlecrab_io::{Policy, RateController, RateLimit};

/// Main configuration structure for the copy tool
///
/// Built from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source path, `-` for stdin
    pub input: String,
    /// Sink path, `-` for stdout
    pub output: String,
    /// Limit applied to reads from the source
    pub read: LimitConfig,
    /// Limit applied to writes to the sink
    pub write: LimitConfig,
    /// Policy used by both directions
    pub policy: Policy,
    /// Bytes requested per transfer
    pub chunk_size: usize,
    /// Back-off after a refused transfer
    pub retry_interval: Duration,
    /// Idle credit bound for raters, `None` for unbounded
    pub idle_credit: Option<Duration>,
    /// Print run statistics as JSON to stderr
    pub stats_json: bool,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// One direction's limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitConfig {
    /// Byte rate; zero or below disables the limit
    pub rate: RateLimit,
    /// Shared budget key; empty for a private budget
    pub key: String,
}

impl LimitConfig {
    pub fn is_limited(&self) -> bool {
        !self.rate.is_unlimited()
    }
}

/// Command-line arguments for the copy tool
///
/// Rates accept a plain number of bytes per second or a number with a unit,
/// e.g. `65536`, `64K`, `64KiB`, `2MiB`, `1G`.
#[derive(Parser, Debug)]
#[command(
    name = "throttlecrab-io",
    about = "Copy a stream at a limited byte rate",
    long_about = "Copies INPUT to OUTPUT, limiting the read side, the write side, or both to a byte rate.\n\nStreams given the same key share one budget with every other stream using that key in this process.\n\nEnvironment variables with THROTTLECRAB_IO_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "PATH",
        help = "Source file, - for stdin",
        default_value = "-",
        env = "THROTTLECRAB_IO_INPUT"
    )]
    pub input: String,
    #[arg(
        long,
        value_name = "PATH",
        help = "Destination file, - for stdout",
        default_value = "-",
        env = "THROTTLECRAB_IO_OUTPUT"
    )]
    pub output: String,

    // Read side
    #[arg(
        long,
        value_name = "RATE",
        help = "Read rate limit, 0 for unlimited",
        default_value = "0",
        env = "THROTTLECRAB_IO_READ_LIMIT"
    )]
    pub read_limit: RateLimit,
    #[arg(
        long,
        value_name = "KEY",
        help = "Shared budget key for reads",
        default_value = "",
        env = "THROTTLECRAB_IO_READ_KEY"
    )]
    pub read_key: String,

    // Write side
    #[arg(
        long,
        value_name = "RATE",
        help = "Write rate limit, 0 for unlimited",
        default_value = "0",
        env = "THROTTLECRAB_IO_WRITE_LIMIT"
    )]
    pub write_limit: RateLimit,
    #[arg(
        long,
        value_name = "KEY",
        help = "Shared budget key for writes",
        default_value = "",
        env = "THROTTLECRAB_IO_WRITE_KEY"
    )]
    pub write_key: String,

    // Throttling behaviour
    #[arg(
        long,
        value_name = "POLICY",
        help = "Throttling policy: sleep (alias pace), discard (alias refuse)",
        default_value = "sleep",
        env = "THROTTLECRAB_IO_POLICY"
    )]
    pub policy: Policy,
    #[arg(
        long,
        value_name = "BYTES",
        help = "Bytes per transfer",
        default_value_t = 32 * 1024,
        env = "THROTTLECRAB_IO_CHUNK_SIZE"
    )]
    pub chunk_size: usize,
    #[arg(
        long,
        value_name = "MS",
        help = "Back-off after a refused transfer (milliseconds)",
        default_value_t = 10,
        env = "THROTTLECRAB_IO_RETRY_INTERVAL_MS"
    )]
    pub retry_interval_ms: u64,
    #[arg(
        long,
        value_name = "MS",
        help = "Idle credit bound (milliseconds), 0 for unbounded",
        default_value_t = 1000,
        env = "THROTTLECRAB_IO_IDLE_CREDIT_MS"
    )]
    pub idle_credit_ms: u64,

    // General options
    #[arg(
        long,
        help = "Print run statistics as JSON to stderr",
        env = "THROTTLECRAB_IO_STATS_JSON"
    )]
    pub stats_json: bool,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "THROTTLECRAB_IO_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// Exits the process after printing the table for `--list-env-vars`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    /// Build and validate configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            input: args.input,
            output: args.output,
            read: LimitConfig {
                rate: args.read_limit,
                key: args.read_key,
            },
            write: LimitConfig {
                rate: args.write_limit,
                key: args.write_key,
            },
            policy: args.policy,
            chunk_size: args.chunk_size,
            retry_interval: Duration::from_millis(args.retry_interval_ms),
            idle_credit: match args.idle_credit_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            stats_json: args.stats_json,
            log_level: args.log_level,
        };

        config.validate()?;

        Ok(config)
    }

    /// Check if either direction is throttled
    pub fn has_any_limit(&self) -> bool {
        self.read.is_limited() || self.write.is_limited()
    }

    /// Build the controller both directions resolve their raters on
    pub fn controller(&self) -> RateController {
        let builder = RateController::builder().capacity(2);
        match self.idle_credit {
            Some(credit) => builder.idle_credit(credit),
            None => builder.unbounded_idle_credit(),
        }
        .build()
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk size is zero, or if refused transfers
    /// would be retried without any back-off.
    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(anyhow!("--chunk-size must be greater than zero"));
        }

        if self.policy == Policy::Discard && self.has_any_limit() && self.retry_interval.is_zero()
        {
            return Err(anyhow!(
                "--retry-interval-ms must be greater than zero with the discard policy.\n\n\
                A refused transfer is retried after this interval; with zero the copy\n\
                would spin on the rate limiter.\n\n\
                Example:\n  \
                throttlecrab-io --write-limit 1MiB --policy discard --retry-interval-ms 5"
            ));
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("ThrottleCrab IO Environment Variables");
        println!("=====================================");
        println!();
        println!("All environment variables use the THROTTLECRAB_IO_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Streams:");
        println!("  THROTTLECRAB_IO_INPUT=<path>             Source file, - for stdin [default: -]");
        println!(
            "  THROTTLECRAB_IO_OUTPUT=<path>            Destination file, - for stdout [default: -]"
        );
        println!();

        println!("Limits:");
        println!(
            "  THROTTLECRAB_IO_READ_LIMIT=<rate>        Read rate limit, 0 for unlimited [default: 0]"
        );
        println!("  THROTTLECRAB_IO_READ_KEY=<key>           Shared budget key for reads [default: none]");
        println!(
            "  THROTTLECRAB_IO_WRITE_LIMIT=<rate>       Write rate limit, 0 for unlimited [default: 0]"
        );
        println!("  THROTTLECRAB_IO_WRITE_KEY=<key>          Shared budget key for writes [default: none]");
        println!();
        println!("  Rates are bytes per second, optionally with a unit: K, KiB, M, MiB, G, GiB");
        println!();

        println!("Throttling:");
        println!(
            "  THROTTLECRAB_IO_POLICY=<policy>          Throttling policy: sleep (alias pace), discard (alias refuse) [default: sleep]"
        );
        println!("  THROTTLECRAB_IO_CHUNK_SIZE=<bytes>       Bytes per transfer [default: 32768]");
        println!(
            "  THROTTLECRAB_IO_RETRY_INTERVAL_MS=<ms>   Back-off after a refused transfer [default: 10]"
        );
        println!(
            "  THROTTLECRAB_IO_IDLE_CREDIT_MS=<ms>      Idle credit bound, 0 for unbounded [default: 1000]"
        );
        println!();

        println!("General Configuration:");
        println!(
            "  THROTTLECRAB_IO_STATS_JSON=true|false    Print run statistics as JSON to stderr"
        );
        println!(
            "  THROTTLECRAB_IO_LOG_LEVEL=<level>        Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # Cap uploads at 1 MiB/s");
        println!("  export THROTTLECRAB_IO_WRITE_LIMIT=1MiB");
        println!();
        println!("  # Refuse instead of sleeping, retrying every 5ms");
        println!("  export THROTTLECRAB_IO_POLICY=discard");
        println!("  export THROTTLECRAB_IO_RETRY_INTERVAL_MS=5");
        println!();
        println!("  # Run (CLI args override env vars)");
        println!("  throttlecrab-io --write-limit 2MiB  # Will use 2 MiB/s, not 1 MiB/s");
    }
}
