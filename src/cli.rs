// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Running the tool with no arguments performs a full sync against the public
// test-case service. Every flag can also come from an environment variable,
// which is what CI jobs usually set.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct definition
// - Option<Commands>: the subcommand is optional, `sync` is the default
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://rcomp-cases.wxzheng.pro/api";
pub const DEFAULT_OUT_DIR: &str = "@official";
pub const DEFAULT_JOBS: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// The whole CLI. Flags marked `global = true` are accepted before or after
// the subcommand name.
#[derive(Parser, Debug)]
#[command(
    name = "rcomp-cases",
    version,
    about = "Mirror compiler test cases from the rcomp-cases service",
    long_about = "rcomp-cases downloads every test case (source, input and expected output) \
                  published by the rcomp-cases service into a local directory. \
                  Later runs only re-download stages that changed upstream."
)]
pub struct Cli {
    /// Root URL of the test-case service API
    #[arg(long, env = "RCOMP_CASES_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Directory the test cases are mirrored into
    #[arg(short, long, env = "RCOMP_CASES_DIR", default_value = DEFAULT_OUT_DIR, global = true)]
    pub out_dir: PathBuf,

    /// Maximum number of file downloads in flight at once
    #[arg(short, long, env = "RCOMP_JOBS", default_value_t = DEFAULT_JOBS, global = true)]
    pub jobs: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "RCOMP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Ignore the cached stages.json and re-download every stage
    #[arg(long, global = true)]
    pub force: bool,

    /// Print the result as JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Download new and changed test cases (the default)
    Sync,

    /// List the stages published by the service without downloading anything
    Stages,
}

impl Cli {
    pub fn action(&self) -> Commands {
        self.command.unwrap_or(Commands::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_means_sync() {
        let cli = Cli::try_parse_from(["rcomp-cases"]).unwrap();
        assert_eq!(cli.action(), Commands::Sync);
        assert!(!cli.force);
        assert!(!cli.json);
    }

    #[test]
    fn test_stages_subcommand_with_global_json() {
        let cli = Cli::try_parse_from(["rcomp-cases", "stages", "--json"]).unwrap();
        assert_eq!(cli.action(), Commands::Stages);
        assert!(cli.json);
    }

    #[test]
    fn test_sync_flags() {
        let cli = Cli::try_parse_from([
            "rcomp-cases",
            "--force",
            "-j",
            "4",
            "-o",
            "cases",
            "--base-url",
            "http://localhost:8080/api",
        ])
        .unwrap();
        assert!(cli.force);
        assert_eq!(cli.jobs, 4);
        assert_eq!(cli.out_dir, PathBuf::from("cases"));
        assert_eq!(cli.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn test_explicit_sync_subcommand_takes_sync_flags() {
        let cli = Cli::try_parse_from([
            "rcomp-cases",
            "sync",
            "--force",
            "-o",
            "cases",
            "--jobs",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.action(), Commands::Sync);
        assert!(cli.force);
        assert_eq!(cli.out_dir, PathBuf::from("cases"));
        assert_eq!(cli.jobs, 2);
    }

    #[test]
    fn test_rejects_non_numeric_jobs() {
        assert!(Cli::try_parse_from(["rcomp-cases", "--jobs", "many"]).is_err());
    }
}
