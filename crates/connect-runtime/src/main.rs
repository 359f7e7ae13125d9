//! # connect-kit
//!
//! Command line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use connect_runtime::cli::{execute, Args};
use connect_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = args.log_level {
        telemetry.log_level = level;
    }
    let _guard = init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let output = execute(args.command).await?;
    println!("{output}");
    Ok(())
}
