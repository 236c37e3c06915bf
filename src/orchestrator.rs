use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::{info, warn};

use crate::error::{CIDiffError, Result};
use crate::output::PhaseProgress;
use crate::providers::{load_jobs, GitLabProvider, GitLabSettings};
use crate::rendering::{FetchedPipeline, PipelineComparison, PipelineRendering};

/// Where the job records of one pipeline rendering come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// An existing pipeline of the configured GitLab project
    Pipeline(u64),
    /// A JSON or YAML file holding job records
    File(PathBuf),
}

impl FromStr for JobSource {
    type Err = CIDiffError;

    /// A purely numeric argument names a GitLab pipeline, anything else a file.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CIDiffError::InvalidSource {
                source_arg: s.to_string(),
                reason: "expected a pipeline id or a file path".to_string(),
            });
        }

        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse()
                .map(Self::Pipeline)
                .map_err(|e| CIDiffError::InvalidSource {
                    source_arg: s.to_string(),
                    reason: format!("invalid pipeline id: {e}"),
                });
        }

        Ok(Self::File(PathBuf::from(trimmed)))
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipeline(id) => write!(f, "pipeline #{id}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Obtains job records for job sources and runs them through the graph
/// builder and differ.
pub struct Orchestrator {
    gitlab: Option<GitLabProvider>,
}

impl Orchestrator {
    /// Creates an orchestrator. Without GitLab settings only file sources can
    /// be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the GitLab client cannot be built from `gitlab`.
    pub fn new(gitlab: Option<&GitLabSettings>) -> Result<Self> {
        let gitlab = gitlab.map(GitLabProvider::new).transpose()?;
        Ok(Self { gitlab })
    }

    fn label(&self, source: &JobSource) -> String {
        match (source, &self.gitlab) {
            (JobSource::Pipeline(id), Some(provider)) => format!("{}#{id}", provider.project()),
            _ => source.to_string(),
        }
    }

    async fn fetch(&self, source: &JobSource) -> Result<FetchedPipeline> {
        match source {
            JobSource::File(path) => Ok(FetchedPipeline {
                jobs: load_jobs(path).await?,
                ..FetchedPipeline::default()
            }),
            JobSource::Pipeline(id) => {
                let provider = self.gitlab.as_ref().ok_or_else(|| {
                    CIDiffError::Config(format!(
                        "a GitLab project is required to read pipeline #{id}"
                    ))
                })?;
                provider.fetch_pipeline_details(*id).await
            }
        }
    }

    /// Renders the job graph of a single source.
    ///
    /// # Errors
    ///
    /// Returns an error if the job records cannot be obtained. A failed fetch
    /// is never turned into an empty graph.
    pub async fn render(&self, source: &JobSource) -> Result<PipelineRendering> {
        info!("Rendering pipeline for: {source}");

        let progress = PhaseProgress::start(2, &format!("Fetching jobs from {source}"));

        let fetched = self.fetch(source).await?;
        if fetched.jobs.is_empty() {
            warn!("No jobs reported for {source}");
        }

        let progress = progress.advance(
            &format!("Fetched {} jobs", fetched.jobs.len()),
            "Building job graph",
        );

        let rendering = PipelineRendering::new(self.label(source), fetched);

        progress.finish(&format!(
            "Built graph with {} jobs",
            rendering.job_graph.len()
        ));

        Ok(rendering)
    }

    /// Renders both sources and reports the structural drift between them.
    ///
    /// The two sources do not depend on each other, so they are fetched
    /// concurrently. The first failure aborts the comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the job records of either source cannot be
    /// obtained.
    pub async fn compare(
        &self,
        baseline: &JobSource,
        candidate: &JobSource,
    ) -> Result<PipelineComparison> {
        info!("Comparing pipeline configurations: {baseline} -> {candidate}");

        let progress = PhaseProgress::start(3, "Fetching baseline and candidate jobs");

        let (baseline_jobs, candidate_jobs) =
            futures::try_join!(self.fetch(baseline), self.fetch(candidate))?;

        let progress = progress.advance(
            &format!(
                "Fetched {} baseline and {} candidate jobs",
                baseline_jobs.jobs.len(),
                candidate_jobs.jobs.len()
            ),
            "Building job graphs",
        );

        let baseline = PipelineRendering::new(self.label(baseline), baseline_jobs);
        let candidate = PipelineRendering::new(self.label(candidate), candidate_jobs);

        let progress = progress.advance("Built job graphs", "Comparing job graphs");

        let comparison = PipelineComparison::new(baseline, candidate);

        progress.finish(&format!(
            "Found {} structural changes",
            comparison.comparison.change_count()
        ));

        Ok(comparison)
    }
}
