// src/extract/mod.rs
// =============================================================================
// This module turns the service's raw JSON into things we can act on.
//
// Submodules:
// - types: stage list, test case and download task types
// - testcases: marker scanning (stage lists, listings, file contents)
// - plan: incremental-update decision against the previous run
//
// Nothing in here touches the network or the disk.
// =============================================================================

mod plan;
mod testcases;
mod types;

pub use plan::{plan_sync, SyncPlan};
pub use testcases::{
    extract_content, extract_testcases, is_path_component, parse_stages, plan_downloads,
    Extraction,
};
pub use types::{DownloadTask, PathKind, StagesPayload, TestCase};
