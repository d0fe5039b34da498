// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments using clap and validate them
// 3. Dispatch to the sync or stages handler
// 4. Print the result and exit with a proper code
//    (0 = success, 1 = some stages/files failed, 2 = error)
// =============================================================================

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod store;
mod sync;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;
use error::ScrapeError;
use fetch::CaseClient;
use store::CaseStore;
use sync::{SyncOptions, SyncOutcome, SyncReport};

#[tokio::main]
async fn main() {
    // Logs go to stderr so `--json` output on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;
    let client = CaseClient::from_config(&config)?;

    match cli.action() {
        Commands::Sync => handle_sync(&client, &config, cli.json).await,
        Commands::Stages => list_stages(&client, &mut io::stdout(), cli.json).await,
    }
}

// Handles the default 'sync' command
async fn handle_sync(client: &CaseClient, config: &Config, json: bool) -> Result<i32> {
    let store = CaseStore::new(&config.out_dir);

    if !json {
        println!("🔍 Syncing test cases from {}", config.base_url);
        println!("📁 Target directory: {}", store.root().display());
    }

    let report = sync::run_sync(client, &store, SyncOptions::from(config))
        .await
        .context("sync failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        write_summary(&mut io::stdout(), &report)?;
    }

    Ok(if report.has_failures() { 1 } else { 0 })
}

// Handles the 'stages' command: list what the service publishes
//
// An empty stage list is reported like `sync` reports it, with exit code 0.
async fn list_stages(client: &CaseClient, out: &mut impl Write, json: bool) -> Result<i32> {
    let payload = match client.fetch_stages().await {
        Ok(payload) => payload,
        Err(ScrapeError::EmptyResult { url }) => {
            warn!(url = %url, "service lists no stages");
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&serde_json::json!({"stages": []}))?)?;
            } else {
                writeln!(out, "⚠️  The service lists no stages")?;
            }
            return Ok(0);
        }
        Err(e) => return Err(e).context("could not fetch the stage list"),
    };

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(0);
    }

    if let Some(hash) = payload.git_hash() {
        writeln!(out, "git hash: {}", hash)?;
    }
    writeln!(out, "{:<30} {:<30}", "STAGE", "LAST UPDATED")?;
    writeln!(out, "{}", "=".repeat(61))?;
    for stage in &payload.stages {
        let updated = match &stage.last_updated {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        };
        writeln!(out, "{:<30} {:<30}", stage.name, updated)?;
    }

    Ok(0)
}

fn write_summary(out: &mut impl Write, report: &SyncReport) -> io::Result<()> {
    match report.outcome {
        SyncOutcome::NoStages => return writeln!(out, "⚠️  The service lists no stages"),
        SyncOutcome::UpToDate => {
            return writeln!(out, "✅ No update detected (git hash unchanged). Skipping download.")
        }
        SyncOutcome::NoChanges => {
            return writeln!(out, "✅ No stages changed since last run. Nothing to update.")
        }
        SyncOutcome::Synced => {}
    }

    writeln!(out, "📄 Processed {} stage(s): {}", report.stages.len(), report.stages.join(", "))?;

    for failure in &report.failed_stages {
        writeln!(out, "   ❌ stage {}: {}", failure.stage, failure.error)?;
    }

    let failed = report.failed_downloads();
    if failed > 0 {
        writeln!(out)?;
        writeln!(out, "{:<50} {:<50}", "FILE", "ERROR")?;
        writeln!(out, "{}", "=".repeat(101))?;
        for download in report.downloads.iter().filter(|d| !d.is_ok()) {
            writeln!(
                out,
                "{:<50} {:<50}",
                download.local_path.display(),
                download.error.as_deref().unwrap_or("")
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "📊 Summary:")?;
    writeln!(out, "   🧪 Test cases saved: {}", report.testcases)?;
    if report.skipped_entries > 0 {
        writeln!(out, "   ⏭️  Entries skipped: {}", report.skipped_entries)?;
    }
    writeln!(
        out,
        "   ✅ Downloads OK: {}/{}",
        report.downloads.len() - failed,
        report.downloads.len()
    )?;
    if failed > 0 {
        writeln!(out, "   ❌ Downloads failed: {}", failed)?;
    }

    // stages.json is already updated, so a plain re-run would skip these
    if report.has_failures() {
        writeln!(out)?;
        writeln!(out, "💡 Re-run with --force to retry the failed stages and files.")?;
    }

    Ok(())
}
