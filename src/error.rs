// src/error.rs
// =============================================================================
// Error types shared by the fetch, extract and write stages.
//
// The binary's top level still uses anyhow (see main.rs); everything below it
// returns a ScrapeError so callers can tell a dead network from a bad
// response from a full disk.
// =============================================================================

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The remote could not be reached (DNS, connect, timeout, broken body)
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered, but not with a 2xx status
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },

    /// The remote answered with a listing that has no entries
    #[error("no entries found at {url}")]
    EmptyResult { url: String },

    /// The expected markers were missing from a response
    #[error("unexpected response from {context}: {message}")]
    Parse { context: String, message: String },

    /// A local read or write failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl ScrapeError {
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        ScrapeError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ScrapeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_the_path() {
        let err = ScrapeError::io(
            Path::new("out/stage/case/a.sy"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("out/stage/case/a.sy"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = ScrapeError::parse("stage lv1", "missing `testcases` array");
        assert_eq!(
            err.to_string(),
            "unexpected response from stage lv1: missing `testcases` array"
        );
    }
}
