// src/store/writer.rs
// =============================================================================
// Writes the local mirror.
//
// Layout under the output directory:
//   stages.json                               stage list from the last run
//   <stage>/<testcase>/testcase_info.json     the listing entry, verbatim
//   <stage>/<testcase>/<file name>            downloaded source/input/output
//
// JSON is written with 4-space indentation. Parent directories are created
// on demand.
// =============================================================================

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::fs;
use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::extract::{DownloadTask, StagesPayload, TestCase};

pub const METADATA_FILE: &str = "stages.json";
pub const INFO_FILE: &str = "testcase_info.json";

#[derive(Debug, Clone)]
pub struct CaseStore {
    root: PathBuf,
}

impl CaseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CaseStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ScrapeError::io(&self.root, e))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    // Loads the stage list saved by the previous run
    //
    // A missing file means this is the first run. An unreadable or malformed
    // one is treated the same way, with a warning, so a corrupt cache only
    // costs a full re-download.
    pub async fn load_metadata(&self) -> Option<StagesPayload> {
        let path = self.metadata_path();

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read cached stage list");
                return None;
            }
        };

        match serde_json::from_str(&text) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed cached stage list");
                None
            }
        }
    }

    pub async fn save_metadata(&self, payload: &StagesPayload) -> Result<()> {
        write_json(&self.metadata_path(), payload).await
    }

    pub fn testcase_dir(&self, stage: &str, testcase: &str) -> PathBuf {
        self.root.join(stage).join(testcase)
    }

    /// Writes `testcase_info.json` for one test case and returns its path
    pub async fn save_testcase_info(&self, case: &TestCase) -> Result<PathBuf> {
        let path = self.testcase_dir(&case.stage, &case.name).join(INFO_FILE);
        write_json(&path, &case.entry).await?;
        Ok(path)
    }

    pub fn file_path(&self, task: &DownloadTask) -> PathBuf {
        self.testcase_dir(&task.stage, &task.testcase)
            .join(&task.file_name)
    }

    // Writes a downloaded body, replacing any previous copy
    pub async fn write_file(&self, path: &Path, body: &str) -> Result<()> {
        write_bytes(path, body.as_bytes()).await
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|e| ScrapeError::io(path, e.into()))?;

    write_bytes(path, &buf).await
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ScrapeError::io(parent, e))?;
    }

    fs::write(path, bytes)
        .await
        .map_err(|e| ScrapeError::io(path, e))
}
