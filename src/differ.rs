use std::collections::{BTreeSet, HashSet};
use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};

use crate::graph::PipelineGraph;

/// A job whose stage differs between baseline and candidate.
///
/// Serialized as the display string `"<job>: <from> -> <to>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageChange {
    pub job: String,
    pub from: String,
    pub to: String,
}

impl fmt::Display for StageChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.job, self.from, self.to)
    }
}

impl Serialize for StageChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A job whose legacy `dependencies` set differs between baseline and candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
    pub job: String,
    /// Present in the baseline, absent in the candidate
    pub removed: BTreeSet<String>,
    /// Present in the candidate, absent in the baseline
    pub added: BTreeSet<String>,
}

/// Structural drift between two pipeline graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub jobs_added: BTreeSet<String>,
    pub jobs_removed: BTreeSet<String>,
    pub stage_changes: Vec<StageChange>,
    pub dependency_changes: Vec<DependencyChange>,
}

impl ComparisonResult {
    /// True when the two graphs have no structural drift.
    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn change_count(&self) -> usize {
        self.jobs_added.len()
            + self.jobs_removed.len()
            + self.stage_changes.len()
            + self.dependency_changes.len()
    }
}

/// Compares a candidate graph against a baseline.
///
/// Jobs present on only one side are reported as added or removed and are
/// never inspected further. For jobs present on both sides the stage is
/// compared by value and `dependencies` is compared as an unordered set.
///
/// `needs` edges are deliberately left out of the comparison. A job that moves
/// from `dependencies` to `needs` therefore shows up as a dependency removal
/// only, and a change confined to `needs` is not reported at all.
///
/// Entries for common jobs are emitted in job-name order so the result is
/// identical across calls.
pub fn compare(baseline: &PipelineGraph, candidate: &PipelineGraph) -> ComparisonResult {
    let baseline_names: HashSet<&str> = baseline.iter().map(|(name, _)| name).collect();
    let candidate_names: HashSet<&str> = candidate.iter().map(|(name, _)| name).collect();

    let jobs_added = candidate_names
        .difference(&baseline_names)
        .map(|name| (*name).to_string())
        .collect();
    let jobs_removed = baseline_names
        .difference(&candidate_names)
        .map(|name| (*name).to_string())
        .collect();

    let mut common: Vec<&str> = baseline_names
        .intersection(&candidate_names)
        .copied()
        .collect();
    common.sort_unstable();

    let mut stage_changes = Vec::new();
    let mut dependency_changes = Vec::new();

    for name in common {
        let (Some(old), Some(new)) = (baseline.get(name), candidate.get(name)) else {
            continue;
        };

        if old.stage != new.stage {
            stage_changes.push(StageChange {
                job: name.to_string(),
                from: old.stage.clone(),
                to: new.stage.clone(),
            });
        }

        let old_deps: HashSet<&str> = old.dependencies.iter().map(String::as_str).collect();
        let new_deps: HashSet<&str> = new.dependencies.iter().map(String::as_str).collect();

        if old_deps != new_deps {
            dependency_changes.push(DependencyChange {
                job: name.to_string(),
                removed: old_deps
                    .difference(&new_deps)
                    .map(|dep| (*dep).to_string())
                    .collect(),
                added: new_deps
                    .difference(&old_deps)
                    .map(|dep| (*dep).to_string())
                    .collect(),
            });
        }
    }

    let result = ComparisonResult {
        jobs_added,
        jobs_removed,
        stage_changes,
        dependency_changes,
    };

    debug!(
        "Compared {} baseline jobs against {} candidate jobs: {} changes",
        baseline.len(),
        candidate.len(),
        result.change_count()
    );

    result
}
