// src/config.rs
// =============================================================================
// Validated runtime configuration.
//
// clap has already merged flags, environment variables and defaults; this
// module checks the values make sense and turns them into the types the rest
// of the program wants (a parsed Url, a Duration).
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cli::Cli;
use crate::error::{Result, ScrapeError};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the service API, e.g. http://rcomp-cases.wxzheng.pro/api
    pub base_url: Url,
    /// Directory the mirror is written to
    pub out_dir: PathBuf,
    /// Upper bound on concurrent downloads, always >= 1
    pub jobs: usize,
    pub timeout: Duration,
    pub force: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let base_url = parse_base_url(&cli.base_url)?;

        if cli.jobs == 0 {
            return Err(ScrapeError::Config("--jobs must be at least 1".to_string()));
        }
        if cli.timeout_secs == 0 {
            return Err(ScrapeError::Config(
                "--timeout-secs must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            base_url,
            out_dir: cli.out_dir.clone(),
            jobs: cli.jobs,
            timeout: Duration::from_secs(cli.timeout_secs),
            force: cli.force,
        })
    }
}

// Only http(s) URLs that can carry path segments are usable as an API root
fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScrapeError::Config(format!("invalid base URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ScrapeError::Config(format!(
            "base URL must be http or https: {}",
            raw
        )));
    }

    Ok(url)
}
