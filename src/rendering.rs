use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::differ::{self, ComparisonResult};
use crate::graph::PipelineGraph;
use crate::jobs::{JobRecord, JobStatus};

/// Upstream metadata of the pipeline a rendering was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub id: u64,
    pub status: JobStatus,
    #[serde(rename = "ref", default)]
    pub ref_: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A CI/CD variable attached to a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineVariable {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub variable_type: Option<String>,
}

/// Raw records obtained for one job source, before any graph is built.
#[derive(Debug, Clone, Default)]
pub struct FetchedPipeline {
    pub pipeline: Option<PipelineInfo>,
    pub jobs: Vec<JobRecord>,
    pub variables: Vec<PipelineVariable>,
}

/// The job topology rendered for one job source.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRendering {
    /// Human-readable label of the job source (file path or pipeline id)
    pub source: String,
    pub pipeline: Option<PipelineInfo>,
    pub jobs: Vec<JobRecord>,
    pub variables: Vec<PipelineVariable>,
    pub job_graph: PipelineGraph,
    pub rendered_at: DateTime<Utc>,
}

impl PipelineRendering {
    pub fn new(source: String, fetched: FetchedPipeline) -> Self {
        let job_graph = PipelineGraph::build(fetched.jobs.iter().cloned());

        Self {
            source,
            pipeline: fetched.pipeline,
            jobs: fetched.jobs,
            variables: fetched.variables,
            job_graph,
            rendered_at: Utc::now(),
        }
    }
}

/// Two renderings side by side with the structural drift between them.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineComparison {
    pub baseline: PipelineRendering,
    pub candidate: PipelineRendering,
    pub comparison: ComparisonResult,
}

impl PipelineComparison {
    pub fn new(baseline: PipelineRendering, candidate: PipelineRendering) -> Self {
        let comparison = differ::compare(&baseline.job_graph, &candidate.job_graph);

        Self {
            baseline,
            candidate,
            comparison,
        }
    }
}
