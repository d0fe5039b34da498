// src/sync/mod.rs
// =============================================================================
// This module runs the whole mirror update: stage list -> listings -> files.
//
// Features:
// - Incremental: skips the run when the upstream git hash is unchanged and
//   only re-fetches stages whose `last_updated` moved
// - Bounded concurrency for file downloads (--jobs)
// - Per-stage and per-file failures are reported without aborting the run
// =============================================================================

mod pipeline;

pub use pipeline::{run_sync, SyncOptions, SyncOutcome, SyncReport};
#[cfg(test)]
pub use pipeline::{DownloadResult, StageFailure};
