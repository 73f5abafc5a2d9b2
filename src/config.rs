use crate::poller::OverlapPolicy;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000/";

/// bfsx - headless explorer client for a bfs chain node
///
/// Polls the node's explorer API and keeps a live view of recent blocks and
/// the pending pool, optionally resolving one detail route.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "bfsx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explorer client for a bfs chain node", long_about = None)]
pub struct CliArgs {
    /// Explorer API base URL
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Polling interval in milliseconds (100-10000)
    #[arg(long, env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Per-request timeout in milliseconds (500-60000)
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// What a tick does while the previous one is still fetching: skip or allow
    #[arg(long, env = "POLL_OVERLAP", value_parser = clap::value_parser!(OverlapPolicy))]
    pub overlap: Option<OverlapPolicy>,

    /// Detail route to open, e.g. /block/12, /acc/0xabc, /tx/3/0xfe
    pub route: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub overlap: OverlapPolicy,
    pub route: Option<String>,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Print current configuration
    pub fn print_summary(&self) {
        eprintln!("bfsx configuration:");
        eprintln!("  API URL: {}", self.api_url);
        eprintln!("  Poll Interval: {}ms", self.poll_interval_ms);
        eprintln!("  Request Timeout: {}ms", self.request_timeout_ms);
        eprintln!("  Overlap: {}", self.overlap);
        if let Some(route) = &self.route {
            eprintln!("  Route: {route}");
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// The API is plain HTTP(S)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    from_args(CliArgs::parse())
}

pub fn from_args(args: CliArgs) -> Result<Config> {
    let api_url = args
        .api_url
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    validate_url(&api_url, "API_URL")?;

    let poll_interval_ms =
        validate_in_range(args.poll_interval_ms.unwrap_or(1000), 100, 10000, "POLL_INTERVAL_MS")?;

    let request_timeout_ms = validate_in_range(
        args.request_timeout_ms.unwrap_or(8000),
        500,
        60000,
        "REQUEST_TIMEOUT_MS",
    )?;

    Ok(Config {
        api_url,
        poll_interval_ms,
        request_timeout_ms,
        overlap: args.overlap.unwrap_or_default(),
        route: args.route.filter(|r| !r.trim().is_empty()),
    })
}
