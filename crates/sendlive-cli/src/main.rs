#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;

use std::process;

use anyhow::Context;
use sendlive::SendLive;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "sendlive_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "sendlive_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "sendlive_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "stream provisioned successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "provisioning failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Provisions one stream and prints it as JSON on stdout.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    let credentials = cli.load_credentials()?;
    let provider = credentials.service_provider();
    let options = cli.load_options(provider)?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        provider = %provider,
        stream = %cli.name,
        "provisioning stream"
    );

    let mut sendlive = SendLive::connect(credentials, Some(options))
        .with_context(|| format!("failed to connect to {provider}"))?;
    if let Some(tags) = cli.tags() {
        sendlive = sendlive.with_tags(tags);
    }

    let stream = sendlive
        .create_stream(&cli.name, None)
        .await
        .with_context(|| format!("failed to provision stream {}", cli.name))?;

    let output = serde_json::to_string_pretty(&stream).context("failed to serialize stream")?;
    println!("{output}");

    Ok(())
}
