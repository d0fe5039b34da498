// src/extract/types.rs
// =============================================================================
// Data types for what the service publishes and what we pull out of it.
//
// The service's documents can grow fields we don't know about. StagesPayload
// keeps them in `extra` and TestCase keeps the whole entry, so what we write
// back to disk is what the service sent.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Repository information attached to the stage list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One stage (a named group of test cases)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Opaque change marker; only ever compared for equality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The response of `GET /stages`, also persisted as `stages.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagesPayload {
    #[serde(rename = "gitInfo", default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
    pub stages: Vec<Stage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StagesPayload {
    pub fn git_hash(&self) -> Option<&str> {
        self.git_info.as_ref()?.git_hash.as_deref()
    }
}

/// Which of a test case's files a download refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathKind {
    #[serde(rename = "source_path")]
    Source,
    #[serde(rename = "input_path")]
    Input,
    #[serde(rename = "output_path")]
    Output,
}

impl PathKind {
    pub const ALL: [PathKind; 3] = [PathKind::Source, PathKind::Input, PathKind::Output];

    /// Field name of this path in a test-case entry
    pub fn key(self) -> &'static str {
        match self {
            PathKind::Source => "source_path",
            PathKind::Input => "input_path",
            PathKind::Output => "output_path",
        }
    }
}

/// A single test case extracted from a stage listing
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub stage: String,
    pub name: String,
    /// The listing entry exactly as the service returned it
    pub entry: Value,
}

impl TestCase {
    /// Remote path for `kind`, if the entry has a non-empty one
    pub fn remote_path(&self, kind: PathKind) -> Option<&str> {
        self.entry
            .get(kind.key())
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
    }
}

/// One file to fetch for one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub stage: String,
    pub testcase: String,
    pub kind: PathKind,
    pub remote_path: String,
    /// Last component of `remote_path`; the name the file is saved under
    pub file_name: String,
}
