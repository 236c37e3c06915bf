mod client;
mod provider;

pub use client::GitLabSettings;
pub use provider::GitLabProvider;
