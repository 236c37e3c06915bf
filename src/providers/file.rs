use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{CIDiffError, Result};
use crate::jobs::JobRecord;

/// Accepted layouts for a job file: a bare array of job records, or any
/// object carrying a `jobs` array (such as a saved `render` JSON output).
#[derive(Deserialize)]
#[serde(untagged)]
enum JobsDocument {
    Jobs(Vec<JobRecord>),
    Rendering { jobs: Vec<JobRecord> },
}

impl JobsDocument {
    fn into_jobs(self) -> Vec<JobRecord> {
        match self {
            Self::Jobs(jobs) | Self::Rendering { jobs } => jobs,
        }
    }
}

/// Loads job records from a JSON or YAML file.
///
/// `.yaml` and `.yml` files are parsed as YAML, everything else as JSON.
/// An unreadable or unparsable file is an error; an empty array is a valid
/// pipeline without jobs.
pub async fn load_jobs(path: &Path) -> Result<Vec<JobRecord>> {
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CIDiffError::InvalidSource {
                source_arg: path.display().to_string(),
                reason: format!("cannot read file: {e}"),
            })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    debug!("Parsing job file {} ({extension})", path.display());

    let document: JobsDocument = match extension {
        "yaml" | "yml" => serde_yaml::from_str(&contents)?,
        _ => serde_json::from_str(&contents)?,
    };

    let jobs = document.into_jobs();
    info!("Loaded {} jobs from {}", jobs.len(), path.display());

    Ok(jobs)
}
