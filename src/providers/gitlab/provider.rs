use log::info;

use super::client::{GitLabClient, GitLabSettings, PAGE_SIZE};
use crate::error::{CIDiffError, Result};
use crate::jobs::JobRecord;
use crate::rendering::{FetchedPipeline, PipelineInfo, PipelineVariable};

/// Read-only access to existing GitLab pipelines through the REST v4 API.
///
/// The provider never creates projects, pipelines or tokens. It only lists
/// what an already-created pipeline reports, and every failed request is
/// returned as an error rather than an empty job list.
pub struct GitLabProvider {
    client: GitLabClient,
    project: String,
}

impl GitLabProvider {
    /// Creates a provider for the project named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(settings: &GitLabSettings) -> Result<Self> {
        let client = GitLabClient::new(settings)?;

        Ok(Self {
            client,
            project: settings.project.clone(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub async fn fetch_pipeline(&self, pipeline_id: u64) -> Result<PipelineInfo> {
        let id = pipeline_id.to_string();
        let url = self.client.project_url(&self.project, &["pipelines", &id])?;

        match self.client.get_json::<PipelineInfo>(url).await {
            Ok(page) => Ok(page.body),
            Err(CIDiffError::ApiError { status: 404, .. }) => Err(CIDiffError::PipelineNotFound(
                format!("{}#{pipeline_id}", self.project),
            )),
            Err(e) => Err(e),
        }
    }

    /// Lists every job of a pipeline, following `x-next-page` until exhausted.
    pub async fn fetch_pipeline_jobs(&self, pipeline_id: u64) -> Result<Vec<JobRecord>> {
        let id = pipeline_id.to_string();
        let per_page = PAGE_SIZE.to_string();
        let mut all_jobs = Vec::new();
        let mut page = "1".to_string();

        loop {
            let mut url = self
                .client
                .project_url(&self.project, &["pipelines", &id, "jobs"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &per_page)
                .append_pair("page", &page);

            let response = self.client.get_json::<Vec<JobRecord>>(url).await?;
            all_jobs.extend(response.body);

            match response.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(all_jobs)
    }

    pub async fn fetch_pipeline_variables(&self, pipeline_id: u64) -> Result<Vec<PipelineVariable>> {
        let id = pipeline_id.to_string();
        let url = self
            .client
            .project_url(&self.project, &["pipelines", &id, "variables"])?;

        Ok(self
            .client
            .get_json::<Vec<PipelineVariable>>(url)
            .await?
            .body)
    }

    /// Fetches pipeline metadata, then its jobs and variables concurrently.
    ///
    /// A missing pipeline is reported as `PipelineNotFound` before any job or
    /// variable request is sent.
    pub async fn fetch_pipeline_details(&self, pipeline_id: u64) -> Result<FetchedPipeline> {
        info!(
            "Fetching pipeline {pipeline_id} from project: {}",
            self.project
        );

        let pipeline = self.fetch_pipeline(pipeline_id).await?;
        let (jobs, variables) = futures::try_join!(
            self.fetch_pipeline_jobs(pipeline_id),
            self.fetch_pipeline_variables(pipeline_id),
        )?;

        info!("Fetched {} jobs for pipeline {pipeline_id}", jobs.len());

        Ok(FetchedPipeline {
            pipeline: Some(pipeline),
            jobs,
            variables,
        })
    }
}
