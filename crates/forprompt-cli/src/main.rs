#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use anyhow::Context;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_CONFIG: &str = "forprompt_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "forprompt_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %error,
            "command failed"
        );
    }
    eprintln!("Error: {error:#}");

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    cli.init_tracing();
    cli.log();

    let output = cli.command.execute(cli.client).await?;
    let output = serde_json::to_string_pretty(&output).context("failed to encode output")?;
    println!("{output}");

    Ok(())
}
