// src/extract/plan.rs
// =============================================================================
// Decides which stages need downloading by comparing the freshly fetched
// stage list with the one saved by the previous run.
//
// 1. Same git hash on both sides          -> nothing to do at all
// 2. No previous run (or --force)         -> every stage
// 3. Otherwise                            -> stages that are new or whose
//                                            `last_updated` changed
// =============================================================================

use std::collections::HashMap;

use super::types::{Stage, StagesPayload};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncPlan {
    /// The upstream git hash is unchanged; don't even rewrite stages.json
    UpToDate,
    /// Something changed upstream, but no stage's `last_updated` did
    NoChanges,
    /// Download these stages
    Process {
        stages: Vec<Stage>,
        /// True when there was no usable previous run (or --force)
        full: bool,
    },
}

pub fn plan_sync(previous: Option<&StagesPayload>, current: &StagesPayload, force: bool) -> SyncPlan {
    let previous = match previous {
        Some(previous) if !force => previous,
        _ => {
            return SyncPlan::Process {
                stages: current.stages.clone(),
                full: true,
            }
        }
    };

    if let (Some(old), Some(new)) = (previous.git_hash(), current.git_hash()) {
        if old == new {
            return SyncPlan::UpToDate;
        }
    }

    let previous_by_name: HashMap<&str, &Stage> = previous
        .stages
        .iter()
        .map(|stage| (stage.name.as_str(), stage))
        .collect();

    let changed: Vec<Stage> = current
        .stages
        .iter()
        .filter(|stage| match previous_by_name.get(stage.name.as_str()) {
            Some(old) => old.last_updated != stage.last_updated,
            None => true,
        })
        .cloned()
        .collect();

    if changed.is_empty() {
        SyncPlan::NoChanges
    } else {
        SyncPlan::Process {
            stages: changed,
            full: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(hash: Option<&str>, stages: &[(&str, &str)]) -> StagesPayload {
        let stages: Vec<_> = stages
            .iter()
            .map(|(name, updated)| json!({"name": name, "last_updated": updated}))
            .collect();
        let mut raw = json!({ "stages": stages });
        if let Some(hash) = hash {
            raw["gitInfo"] = json!({ "git_hash": hash });
        }
        serde_json::from_value(raw).unwrap()
    }

    fn names(plan: &SyncPlan) -> Vec<&str> {
        match plan {
            SyncPlan::Process { stages, .. } => stages.iter().map(|s| s.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_first_run_processes_everything() {
        let current = payload(Some("a"), &[("lv1", "1"), ("lv2", "1")]);
        let plan = plan_sync(None, &current, false);
        assert_eq!(names(&plan), vec!["lv1", "lv2"]);
        assert!(matches!(plan, SyncPlan::Process { full: true, .. }));
    }

    #[test]
    fn test_same_hash_is_up_to_date() {
        let previous = payload(Some("a"), &[("lv1", "1")]);
        let current = payload(Some("a"), &[("lv1", "2")]);
        assert_eq!(plan_sync(Some(&previous), &current, false), SyncPlan::UpToDate);
    }

    #[test]
    fn test_force_ignores_hash() {
        let previous = payload(Some("a"), &[("lv1", "1")]);
        let current = payload(Some("a"), &[("lv1", "1")]);
        let plan = plan_sync(Some(&previous), &current, true);
        assert_eq!(names(&plan), vec!["lv1"]);
    }

    #[test]
    fn test_only_changed_and_new_stages() {
        let previous = payload(Some("a"), &[("lv1", "1"), ("lv2", "1")]);
        let current = payload(Some("b"), &[("lv1", "1"), ("lv2", "2"), ("lv3", "1")]);
        let plan = plan_sync(Some(&previous), &current, false);
        assert_eq!(names(&plan), vec!["lv2", "lv3"]);
        assert!(matches!(plan, SyncPlan::Process { full: false, .. }));
    }

    #[test]
    fn test_new_hash_but_no_stage_changes() {
        let previous = payload(Some("a"), &[("lv1", "1")]);
        let current = payload(Some("b"), &[("lv1", "1")]);
        assert_eq!(plan_sync(Some(&previous), &current, false), SyncPlan::NoChanges);
    }

    #[test]
    fn test_missing_hash_falls_back_to_stage_comparison() {
        let previous = payload(None, &[("lv1", "1")]);
        let current = payload(None, &[("lv1", "2")]);
        assert_eq!(names(&plan_sync(Some(&previous), &current, false)), vec!["lv1"]);

        let current = payload(Some("a"), &[("lv1", "1")]);
        assert_eq!(plan_sync(Some(&previous), &current, false), SyncPlan::NoChanges);
    }
}
