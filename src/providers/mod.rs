mod file;
mod gitlab;

pub use file::load_jobs;
pub use gitlab::{GitLabProvider, GitLabSettings};
