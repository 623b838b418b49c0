//! CLI configuration.
//!
//! All options can be given as arguments or environment variables:
//!
//! ```bash
//! sendlive --credentials gcp.json --name my-stream --tag "Team=video"
//!
//! SENDLIVE_CREDENTIALS=gcp.json SENDLIVE_STREAM_NAME=my-stream sendlive
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, anyhow};
use clap::Parser;
use sendlive::aws::AwsOptions;
use sendlive::gcp::GcpOptions;
use sendlive::http::HttpConfig;
use sendlive::{Credentials, ProviderOptions, ServiceProvider, Tags};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "sendlive")]
#[command(about = "Provision a live-stream ingest endpoint on AWS or GCP")]
#[command(version)]
pub struct Cli {
    /// Path to a provider-tagged credentials JSON file
    #[arg(long, env = "SENDLIVE_CREDENTIALS")]
    pub credentials: PathBuf,

    /// Name of the stream, also used as the vendor resource id
    #[arg(short, long, env = "SENDLIVE_STREAM_NAME")]
    pub name: String,

    /// Path to a provider-tagged options JSON file
    #[arg(long, env = "SENDLIVE_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Extra resource tag as KEY=VALUE, may be repeated
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// Vendor request settings.
    #[clap(flatten)]
    pub http: HttpConfig,
}

impl Cli {
    /// Loads `.env` (if enabled) and parses arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Reads and parses the credentials file.
    pub fn load_credentials(&self) -> anyhow::Result<Credentials> {
        let document = read_json(&self.credentials)?;
        Credentials::from_json(document).context("invalid credentials")
    }

    /// Reads the options file, or defaults for `provider`, with the HTTP
    /// settings from the command line applied.
    pub fn load_options(&self, provider: ServiceProvider) -> anyhow::Result<ProviderOptions> {
        let options = match &self.options {
            Some(path) => serde_json::from_value(read_json(path)?)
                .with_context(|| format!("invalid options in {}", path.display()))?,
            None => match provider {
                ServiceProvider::Aws => AwsOptions::default().into(),
                ServiceProvider::Gcp => GcpOptions::default().into(),
            },
        };

        Ok(match options {
            ProviderOptions::Aws(options) => options.with_http_config(self.http.clone()).into(),
            ProviderOptions::Gcp(options) => options.with_http_config(self.http.clone()).into(),
        })
    }

    /// Tags given on the command line.
    pub fn tags(&self) -> Option<Tags> {
        (!self.tags.is_empty()).then(|| self.tags.iter().cloned().collect())
    }

    /// Logs build information and configuration (no secrets).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            credentials = %self.credentials.display(),
            options = ?self.options,
            stream = %self.name,
            tags = ?self.tags,
            request_timeout_secs = self.http.request_timeout_secs,
            "Configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn parse_tag(value: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {value:?}"))?;

    if key.trim().is_empty() {
        return Err(anyhow!("tag key must not be empty"));
    }

    Ok((key.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(
            parse_tag("Team Name = video").unwrap(),
            ("Team Name".to_string(), "video".to_string())
        );
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=value").is_err());
    }

    #[test]
    fn test_default_options_follow_provider() {
        let cli = Cli::parse_from([
            "sendlive",
            "--credentials",
            "creds.json",
            "--name",
            "my-stream",
            "--request-timeout",
            "10",
            "--tag",
            "Team=video",
        ]);

        let ProviderOptions::Gcp(options) = cli.load_options(ServiceProvider::Gcp).unwrap() else {
            panic!("expected GCP options");
        };
        assert_eq!(options.http.request_timeout_secs, 10);
        assert_eq!(cli.tags().unwrap()["Team"], "video");
    }
}
