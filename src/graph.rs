use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::jobs::{JobRecord, JobStatus, When};

/// A job inside a [`PipelineGraph`].
///
/// `dependencies` and `needs` hold job names that refer back into the same
/// graph's key set. They are references by name, not ownership, so a name
/// that is missing from the graph is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNode {
    pub stage: String,
    pub status: JobStatus,
    pub dependencies: Vec<String>,
    pub needs: Vec<String>,
    pub when: When,
    pub allow_failure: bool,
}

impl From<JobRecord> for JobNode {
    fn from(job: JobRecord) -> Self {
        Self {
            stage: job.stage,
            status: job.status,
            dependencies: job.dependencies,
            needs: job.needs,
            when: job.when,
            allow_failure: job.allow_failure,
        }
    }
}

/// Job topology of one pipeline rendering, keyed by job name.
///
/// Nodes live in an insertion-ordered arena: each distinct name gets one slot
/// at its first appearance. Serializes as a plain `{name: node}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineGraph {
    nodes: IndexMap<String, JobNode>,
}

impl PipelineGraph {
    /// Builds a graph with one node per distinct job name.
    ///
    /// When several records share a name the last one wins. This is not an
    /// error: the record simply replaces the node in its original slot.
    /// Cycles are not checked, GitLab rejects cyclic configurations before any
    /// job is listed.
    pub fn build<I>(jobs: I) -> Self
    where
        I: IntoIterator<Item = JobRecord>,
    {
        let mut nodes = IndexMap::new();
        for job in jobs {
            let name = job.name.clone();
            nodes.insert(name, JobNode::from(job));
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&JobNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Distinct stage names in order of first appearance.
    pub fn stages(&self) -> Vec<&str> {
        let mut stages: Vec<&str> = Vec::new();
        for node in self.nodes.values() {
            if !stages.contains(&node.stage.as_str()) {
                stages.push(&node.stage);
            }
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fixtures::{job, job_with_deps, job_with_needs};

    #[test]
    fn test_one_node_per_distinct_name() {
        let graph = PipelineGraph::build(vec![
            job("build", "compile"),
            job("test", "test"),
            job("lint", "test"),
        ]);

        assert_eq!(graph.len(), 3);
        assert!(graph.contains("build"));
        assert!(graph.contains("test"));
        assert!(graph.contains("lint"));
        assert!(!graph.contains("deploy"));
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let graph = PipelineGraph::build(vec![job("x", "a"), job("x", "b")]);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("x").unwrap().stage, "b");
    }

    #[test]
    fn test_overwritten_node_keeps_first_position() {
        let graph = PipelineGraph::build(vec![job("x", "a"), job("y", "a"), job("x", "b")]);

        let names: Vec<&str> = graph.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_defaults_carried_into_node() {
        let record: JobRecord =
            serde_json::from_str(r#"{"name": "build", "stage": "compile", "status": "success"}"#)
                .unwrap();
        let graph = PipelineGraph::build(vec![record]);

        let node = graph.get("build").unwrap();
        assert!(node.dependencies.is_empty());
        assert!(node.needs.is_empty());
        assert_eq!(node.when, When::OnSuccess);
        assert!(!node.allow_failure);
        assert_eq!(node.status, JobStatus::Success);
    }

    #[test]
    fn test_edges_preserved_in_order() {
        let graph = PipelineGraph::build(vec![
            job_with_deps("deploy", "deploy", &["test", "build"]),
            job_with_needs("package", "deploy", &["build"]),
        ]);

        assert_eq!(graph.get("deploy").unwrap().dependencies, vec!["test", "build"]);
        assert_eq!(graph.get("package").unwrap().needs, vec!["build"]);
    }

    #[test]
    fn test_unknown_edge_targets_are_kept() {
        let graph = PipelineGraph::build(vec![job_with_needs("deploy", "deploy", &["ghost"])]);

        assert_eq!(graph.get("deploy").unwrap().needs, vec!["ghost"]);
        assert!(!graph.contains("ghost"));
    }

    #[test]
    fn test_empty_input_builds_empty_graph() {
        let graph = PipelineGraph::build(Vec::new());
        assert!(graph.is_empty());
        assert!(graph.stages().is_empty());
    }

    #[test]
    fn test_stages_in_first_appearance_order() {
        let graph = PipelineGraph::build(vec![
            job("build", "compile"),
            job("unit", "test"),
            job("docs", "compile"),
            job("release", "deploy"),
        ]);

        assert_eq!(graph.stages(), vec!["compile", "test", "deploy"]);
    }

    #[test]
    fn test_serializes_as_name_keyed_object() {
        let graph = PipelineGraph::build(vec![job_with_needs("deploy", "deploy", &["build"])]);

        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "deploy": {
                    "stage": "deploy",
                    "status": "created",
                    "dependencies": [],
                    "needs": ["build"],
                    "when": "on_success",
                    "allow_failure": false
                }
            })
        );
    }
}
