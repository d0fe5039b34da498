// src/sync/pipeline.rs
// =============================================================================
// The fetch -> extract -> write pipeline, run once per invocation.
//
// How it works:
// 1. Fetch the stage list and compare it with the cached stages.json
// 2. Stop early if nothing changed upstream
// 3. Cache the new stage list
// 4. For every stage that needs updating: fetch its listing, save each test
//    case's testcase_info.json, and queue its source/input/output files
// 5. Download the queued files, at most `jobs` at a time
//
// Failure isolation:
// - Stage list unavailable          -> the whole run fails
// - One stage's listing unavailable -> recorded, other stages continue
// - One file unavailable            -> recorded, other files continue
// - testcase_info.json write error  -> the whole run fails
// =============================================================================

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::extract::{
    extract_content, extract_testcases, is_path_component, plan_downloads, plan_sync,
    DownloadTask, Extraction, PathKind, StagesPayload, SyncPlan,
};
use crate::fetch::CaseClient;
use crate::store::CaseStore;

// Log a progress line every this many completed downloads
const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Ignore the cached stage list
    pub force: bool,
    /// Maximum downloads in flight
    pub jobs: usize,
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        SyncOptions {
            force: config.force,
            jobs: config.jobs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The service lists no stages
    NoStages,
    /// Upstream git hash unchanged
    UpToDate,
    /// No stage changed since the last run
    NoChanges,
    Synced,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub stage: String,
    pub testcase: String,
    pub kind: PathKind,
    pub remote_path: String,
    pub local_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
    /// Stages that were (or were attempted to be) processed
    pub stages: Vec<String>,
    pub failed_stages: Vec<StageFailure>,
    /// Test cases whose testcase_info.json was written
    pub testcases: usize,
    /// Listing entries dropped for lack of a usable name
    pub skipped_entries: usize,
    pub downloads: Vec<DownloadResult>,
}

impl SyncReport {
    pub(crate) fn new(outcome: SyncOutcome, git_hash: Option<String>) -> Self {
        SyncReport {
            outcome,
            git_hash,
            stages: Vec::new(),
            failed_stages: Vec::new(),
            testcases: 0,
            skipped_entries: 0,
            downloads: Vec::new(),
        }
    }

    pub fn failed_downloads(&self) -> usize {
        self.downloads.iter().filter(|d| !d.is_ok()).count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_stages.is_empty() || self.failed_downloads() > 0
    }
}

// Runs one full sync against the service
//
// Returns Err only for failures that make the whole run meaningless; partial
// failures are reported inside the SyncReport.
pub async fn run_sync(
    client: &CaseClient,
    store: &CaseStore,
    options: SyncOptions,
) -> Result<SyncReport> {
    store.ensure_root().await?;

    let current = match client.fetch_stages().await {
        Ok(payload) => payload,
        Err(ScrapeError::EmptyResult { url }) => {
            warn!(url = %url, "service lists no stages, nothing to download");
            return Ok(SyncReport::new(SyncOutcome::NoStages, None));
        }
        Err(e) => return Err(e),
    };
    let git_hash = current.git_hash().map(str::to_string);

    let previous = store.load_metadata().await;
    let plan = plan_sync(previous.as_ref(), &current, options.force);

    let (stages, full) = match plan {
        SyncPlan::UpToDate => {
            info!(git_hash = ?git_hash, "no update detected (git hash unchanged)");
            return Ok(SyncReport::new(SyncOutcome::UpToDate, git_hash));
        }
        SyncPlan::NoChanges => {
            cache_stage_list(store, &current).await;
            info!("no stages changed since last run");
            return Ok(SyncReport::new(SyncOutcome::NoChanges, git_hash));
        }
        SyncPlan::Process { stages, full } => {
            cache_stage_list(store, &current).await;
            (stages, full)
        }
    };

    if !full {
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        info!(count = names.len(), stages = %names.join(", "), "updating changed stages");
    }

    let mut report = SyncReport::new(SyncOutcome::Synced, git_hash);
    let mut tasks = Vec::new();

    for stage in &stages {
        report.stages.push(stage.name.clone());

        let extraction = match collect_stage(client, &stage.name).await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(stage = %stage.name, error = %e, "failed to get test cases");
                report.failed_stages.push(StageFailure {
                    stage: stage.name.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        for case in &extraction.cases {
            let path = store.save_testcase_info(case).await?;
            debug!(path = %path.display(), "saved test-case info");
        }

        info!(
            stage = %stage.name,
            testcases = extraction.cases.len(),
            skipped = extraction.skipped,
            "collected stage"
        );
        report.testcases += extraction.cases.len();
        report.skipped_entries += extraction.skipped;
        tasks.extend(plan_downloads(&extraction.cases));
    }

    report.downloads = download_all(client, store, tasks, options.jobs).await;

    Ok(report)
}

// Remembers the stage list for the next run; losing it only costs a full
// re-download next time, so a failure is a warning
async fn cache_stage_list(store: &CaseStore, payload: &StagesPayload) {
    if let Err(e) = store.save_metadata(payload).await {
        warn!(error = %e, "failed to write stage list cache");
    }
}

async fn collect_stage(client: &CaseClient, stage: &str) -> Result<Extraction> {
    if !is_path_component(stage) {
        return Err(ScrapeError::parse(
            format!("stage {}", stage),
            "stage name is not usable as a directory name",
        ));
    }

    let listing = client.fetch_testcases(stage).await?;
    extract_testcases(stage, listing)
}

// Downloads every task with at most `jobs` requests in flight
//
// Results are sorted by stage, test case and kind so reports are stable.
async fn download_all(
    client: &CaseClient,
    store: &CaseStore,
    tasks: Vec<DownloadTask>,
    jobs: usize,
) -> Vec<DownloadResult> {
    let total = tasks.len();
    if total == 0 {
        info!("no files to download");
        return Vec::new();
    }

    let workers = jobs.clamp(1, total);
    info!(total, workers, "starting downloads");

    let mut pending = stream::iter(tasks)
        .map(|task| download_one(client, store, task))
        .buffer_unordered(workers);

    let mut results = Vec::with_capacity(total);
    let mut failed = 0;

    while let Some(result) = pending.next().await {
        if !result.is_ok() {
            failed += 1;
        }
        results.push(result);

        let completed = results.len();
        if should_log_progress(completed, total) {
            info!(completed, total, failed, "download progress");
        }
    }

    results.sort_by(|a, b| {
        (&a.stage, &a.testcase, a.kind).cmp(&(&b.stage, &b.testcase, b.kind))
    });
    results
}

fn should_log_progress(completed: usize, total: usize) -> bool {
    completed % PROGRESS_EVERY == 0 || completed == total
}

async fn download_one(client: &CaseClient, store: &CaseStore, task: DownloadTask) -> DownloadResult {
    let local_path = store.file_path(&task);
    debug!(path = %local_path.display(), "downloading");

    let error = match fetch_and_write(client, store, &task, &local_path).await {
        Ok(()) => None,
        Err(e) => {
            warn!(remote = %task.remote_path, error = %e, "download failed");
            Some(e.to_string())
        }
    };

    DownloadResult {
        stage: task.stage,
        testcase: task.testcase,
        kind: task.kind,
        remote_path: task.remote_path,
        local_path,
        error,
    }
}

async fn fetch_and_write(
    client: &CaseClient,
    store: &CaseStore,
    task: &DownloadTask,
    local_path: &Path,
) -> Result<()> {
    let document = client
        .fetch_file_content(&task.stage, &task.remote_path)
        .await?;
    let content = extract_content(&task.remote_path, document)?;
    store.write_file(local_path, &content).await
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why no tokio::spawn for the downloads?
//    - buffer_unordered polls up to N futures inside this one task
//    - The futures can borrow `client` and `store` instead of cloning them,
//      because they never outlive download_all
//    - spawn would require 'static futures (owned clones of everything)
//
// 2. Why is download_one infallible?
//    - It folds the Result into DownloadResult.error
//    - One bad file must not stop the stream, and the report needs to say
//      which file failed and why
// -----------------------------------------------------------------------------
