use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A single job as reported by the CI platform for one pipeline rendering.
///
/// Only `name`, `stage` and `status` are required. Every other field falls back
/// to its default when it is missing or `null`, since upstream records often
/// omit keys that do not apply to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job name as defined in .gitlab-ci.yml
    pub name: String,
    /// Stage this job belongs to
    pub stage: String,
    /// Reported job status (never acted upon, jobs are not executed)
    pub status: JobStatus,
    /// Legacy stage-based dependencies via the `dependencies` keyword
    #[serde(default, deserialize_with = "nullable")]
    pub dependencies: Vec<String>,
    /// Explicit DAG dependencies via the `needs` keyword
    #[serde(default, deserialize_with = "deserialize_needs")]
    pub needs: Vec<String>,
    /// Execution condition
    #[serde(default, deserialize_with = "nullable")]
    pub when: When,
    /// Whether a failure of this job is tolerated by the pipeline
    #[serde(default, deserialize_with = "nullable")]
    pub allow_failure: bool,
}

/// Job status as reported by GitLab.
///
/// Parsing is case-insensitive so both REST (`success`) and GraphQL
/// (`SUCCESS`) spellings are accepted. Anything else becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum JobStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::WaitingForResource => "waiting_for_resource",
            Self::Preparing => "preparing",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for JobStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "waiting_for_resource" => Self::WaitingForResource,
            "preparing" => Self::Preparing,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            "skipped" => Self::Skipped,
            "manual" => Self::Manual,
            "scheduled" => Self::Scheduled,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition under which a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum When {
    #[default]
    OnSuccess,
    OnFailure,
    Always,
    Manual,
    Delayed,
    Never,
    Unknown,
}

impl When {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnSuccess => "on_success",
            Self::OnFailure => "on_failure",
            Self::Always => "always",
            Self::Manual => "manual",
            Self::Delayed => "delayed",
            Self::Never => "never",
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for When {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "on_success" => Self::OnSuccess,
            "on_failure" => Self::OnFailure,
            "always" => Self::Always,
            "manual" => Self::Manual,
            "delayed" => Self::Delayed,
            "never" => Self::Never,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for When {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `needs` entry: GitLab reports objects with a `name` key, hand-written
/// fixtures often use bare job names.
#[derive(Deserialize)]
#[serde(untagged)]
enum NeedRef {
    Name(String),
    Job { name: String },
}

impl NeedRef {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) | Self::Job { name } => name,
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_needs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let needs: Vec<NeedRef> = nullable(deserializer)?;
    Ok(needs.into_iter().map(NeedRef::into_name).collect())
}
