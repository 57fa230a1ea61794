use anyhow::Result;

use throttlecrab_io_cli::config::Config;
use throttlecrab_io_cli::copy::{copy_throttled, open_input, open_output};

fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging; stdout may be the copy's sink
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("throttlecrab_io={}", config.log_level).parse()?),
        )
        .init();

    let controller = config.controller();

    let mut reader = controller.reader(
        open_input(&config.input)?,
        config.policy,
        config.read.rate,
        &config.read.key,
    );
    let mut writer = controller.writer(
        open_output(&config.output)?,
        config.policy,
        config.write.rate,
        &config.write.key,
    );

    tracing::info!(
        "ThrottleCrab IO copying {} -> {} with policy: {}",
        config.input,
        config.output,
        config.policy
    );
    tracing::info!(
        "Read limit: {} (key {:?}), Write limit: {} (key {:?}), Chunk size: {}",
        config.read.rate,
        config.read.key,
        config.write.rate,
        config.write.key,
        config.chunk_size
    );

    let stats = copy_throttled(
        &mut reader,
        &mut writer,
        config.chunk_size,
        config.retry_interval,
    )?;

    tracing::info!(
        "Copied {} bytes in {:.2}s ({:.0} B/s), refusals: {} read, {} write",
        stats.bytes_copied,
        stats.elapsed_secs,
        stats.bytes_per_sec,
        stats.read_refusals,
        stats.write_refusals
    );

    if config.stats_json {
        eprintln!("{}", serde_json::to_string(&stats)?);
    }

    Ok(())
}
