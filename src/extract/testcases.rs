// src/extract/testcases.rs
// =============================================================================
// Pulls stages, test cases and file bodies out of the service's JSON.
//
// The markers we look for:
// - `stages`    array in the stage list
// - `testcases` array in a stage listing, one object per test case
// - `name`      on every test case (becomes its directory name)
// - `source_path` / `input_path` / `output_path` on a test case
// - `content`   in a file-content response
//
// A listing without its array is an error for that listing. A single entry
// without a usable name is skipped so the rest of the listing still counts.
// =============================================================================

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use super::types::{DownloadTask, PathKind, StagesPayload, TestCase};
use crate::error::{Result, ScrapeError};

/// Result of scanning one stage listing
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub cases: Vec<TestCase>,
    /// Entries dropped because they had no usable name
    pub skipped: usize,
}

// Parses the `GET /stages` document
//
// An empty `stages` array is not an error here; the fetcher decides what an
// empty listing means.
pub fn parse_stages(context: &str, document: Value) -> Result<StagesPayload> {
    serde_json::from_value(document).map_err(|e| ScrapeError::parse(context, e.to_string()))
}

// Extracts the test cases from one stage's listing
//
// Returns at most one TestCase per entry. Entries whose name is missing,
// empty, not a single path component, or already seen are skipped.
pub fn extract_testcases(stage: &str, listing: Value) -> Result<Extraction> {
    let context = format!("stage {}", stage);

    let entries = match listing {
        Value::Object(mut map) => match map.remove("testcases") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err(ScrapeError::parse(context, "`testcases` is not an array")),
            None => return Err(ScrapeError::parse(context, "missing `testcases` array")),
        },
        _ => return Err(ScrapeError::parse(context, "listing is not a JSON object")),
    };

    let mut extraction = Extraction::default();
    let mut seen = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let name = match entry.get("name").and_then(Value::as_str) {
            Some(name) if is_path_component(name) => name.to_string(),
            _ => {
                warn!(stage, index, "skipping test-case entry without a usable name");
                extraction.skipped += 1;
                continue;
            }
        };

        if !seen.insert(name.clone()) {
            warn!(stage, testcase = %name, "skipping duplicate test-case entry");
            extraction.skipped += 1;
            continue;
        }

        extraction.cases.push(TestCase {
            stage: stage.to_string(),
            name,
            entry,
        });
    }

    Ok(extraction)
}

// Pulls the file body out of a `GET /file-content` response
pub fn extract_content(context: &str, document: Value) -> Result<String> {
    match document {
        Value::Object(mut map) => match map.remove("content") {
            Some(Value::String(content)) => Ok(content),
            Some(_) => Err(ScrapeError::parse(context, "`content` is not a string")),
            None => Err(ScrapeError::parse(context, "no `content` field in response")),
        },
        _ => Err(ScrapeError::parse(context, "response is not a JSON object")),
    }
}

// Lists every file the given test cases reference
//
// Order is test case by test case, then source / input / output.
pub fn plan_downloads(cases: &[TestCase]) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();

    for case in cases {
        for kind in PathKind::ALL {
            let Some(remote_path) = case.remote_path(kind) else {
                continue;
            };

            let Some(file_name) = file_name_of(remote_path) else {
                warn!(
                    stage = %case.stage,
                    testcase = %case.name,
                    path = remote_path,
                    "no file name in remote path, skipping"
                );
                continue;
            };

            tasks.push(DownloadTask {
                stage: case.stage.clone(),
                testcase: case.name.clone(),
                kind,
                remote_path: remote_path.to_string(),
                file_name: file_name.to_string(),
            });
        }
    }

    tasks
}

/// True if `name` can be used as one directory or file name
pub fn is_path_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

// "lv1/t0/main.sy" -> "main.sy"
fn file_name_of(remote_path: &str) -> Option<&str> {
    remote_path
        .rsplit('/')
        .next()
        .filter(|name| is_path_component(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_two_entries_give_two_cases() {
        let listing = json!({
            "testcases": [
                {"name": "t0", "source_path": "lv1/t0/main.sy"},
                {"name": "t1", "source_path": "lv1/t1/main.sy"}
            ]
        });
        let extraction = extract_testcases("lv1", listing).unwrap();

        assert_eq!(extraction.cases.len(), 2);
        assert_eq!(extraction.cases[0].name, "t0");
        assert_eq!(extraction.cases[1].name, "t1");
        assert_eq!(extraction.cases[1].stage, "lv1");
        assert_eq!(extraction.skipped, 0);
    }

    #[test]
    fn test_empty_listing_gives_no_cases() {
        let extraction = extract_testcases("lv1", json!({"testcases": []})).unwrap();
        assert!(extraction.cases.is_empty());
        assert_eq!(extraction.skipped, 0);
    }

    #[test]
    fn test_missing_marker_is_parse_error() {
        let result = extract_testcases("lv1", json!({"cases": []}));
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));

        let result = extract_testcases("lv1", json!({"testcases": "nope"}));
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));

        let result = extract_testcases("lv1", json!([1, 2, 3]));
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }

    #[test]
    fn test_malformed_entries_are_skipped_not_fatal() {
        let listing = json!({
            "testcases": [
                {"source_path": "lv1/x/main.sy"},
                {"name": ""},
                {"name": "../escape"},
                {"name": 7},
                "just a string",
                {"name": "good"}
            ]
        });
        let extraction = extract_testcases("lv1", listing).unwrap();

        assert_eq!(extraction.cases.len(), 1);
        assert_eq!(extraction.cases[0].name, "good");
        assert_eq!(extraction.skipped, 5);
    }

    #[test]
    fn test_duplicate_names_are_skipped() {
        let listing = json!({"testcases": [{"name": "t0"}, {"name": "t0"}]});
        let extraction = extract_testcases("lv1", listing).unwrap();
        assert_eq!(extraction.cases.len(), 1);
        assert_eq!(extraction.skipped, 1);
    }

    #[test]
    fn test_never_more_cases_than_entries() {
        for n in 0..6 {
            let entries: Vec<Value> = (0..n)
                .map(|i| {
                    if i % 2 == 0 {
                        json!({"name": format!("t{}", i)})
                    } else {
                        json!({"name": null})
                    }
                })
                .collect();
            let extraction = extract_testcases("lv1", json!({ "testcases": entries })).unwrap();
            assert!(extraction.cases.len() <= n);
            assert_eq!(extraction.cases.len() + extraction.skipped, n);
        }
    }

    #[test]
    fn test_extract_content() {
        assert_eq!(
            extract_content("f", json!({"content": "int main() { return 0; }\n"})).unwrap(),
            "int main() { return 0; }\n"
        );
        assert_eq!(extract_content("f", json!({"content": ""})).unwrap(), "");
        assert!(matches!(
            extract_content("f", json!({"error": "not found"})),
            Err(ScrapeError::Parse { .. })
        ));
        assert!(matches!(
            extract_content("f", json!({"content": 42})),
            Err(ScrapeError::Parse { .. })
        ));
    }

    #[test]
    fn test_plan_downloads_uses_present_paths_only() {
        let cases = extract_testcases(
            "lv1",
            json!({
                "testcases": [
                    {
                        "name": "t0",
                        "source_path": "lv1/t0/main.sy",
                        "input_path": "lv1/t0/in.txt",
                        "output_path": "lv1/t0/out.txt"
                    },
                    {"name": "t1", "source_path": "lv1/t1/main.sy", "input_path": ""},
                    {"name": "t2", "source_path": "lv1/t2/"}
                ]
            }),
        )
        .unwrap()
        .cases;

        let tasks = plan_downloads(&cases);
        let summary: Vec<(&str, PathKind, &str)> = tasks
            .iter()
            .map(|t| (t.testcase.as_str(), t.kind, t.file_name.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("t0", PathKind::Source, "main.sy"),
                ("t0", PathKind::Input, "in.txt"),
                ("t0", PathKind::Output, "out.txt"),
                ("t1", PathKind::Source, "main.sy"),
            ]
        );
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("a/b/c.sy"), Some("c.sy"));
        assert_eq!(file_name_of("c.sy"), Some("c.sy"));
        assert_eq!(file_name_of("a/b/"), None);
        assert_eq!(file_name_of("a/.."), None);
    }

    #[test]
    fn test_parse_stages_requires_stage_list() {
        assert!(parse_stages("stages", json!({"stages": []})).is_ok());
        assert!(matches!(
            parse_stages("stages", json!({"gitInfo": {}})),
            Err(ScrapeError::Parse { .. })
        ));
    }
}
