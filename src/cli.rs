use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::Token;
use crate::config::{Config, GitLabConfig, OutputFormat};
use crate::orchestrator::{JobSource, Orchestrator};
use crate::output;
use crate::providers::GitLabSettings;

#[derive(Parser)]
#[command(name = "cidiff")]
#[command(
    author,
    version,
    about = "Render CI/CD pipeline job graphs and report structural drift between them",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./cidiff.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON output to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the job graph of one pipeline
    Render {
        /// GitLab pipeline id or path to a JSON/YAML job file
        source: JobSource,

        #[command(flatten)]
        gitlab: GitLabArgs,
    },
    /// Compare the job graphs of two pipelines
    Compare {
        /// Baseline pipeline id or job file
        baseline: JobSource,

        /// Candidate pipeline id or job file
        candidate: JobSource,

        #[command(flatten)]
        gitlab: GitLabArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct GitLabArgs {
    #[arg(short, long, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitLab instance base URL [default: https://gitlab.com]
    #[arg(short, long)]
    url: Option<String>,

    /// GitLab project id or path, required for pipeline sources
    #[arg(short = 'P', long)]
    project: Option<String>,

    #[arg(long)]
    max_retries: Option<u32>,

    /// Seconds between retries
    #[arg(long, value_name = "SECONDS")]
    retry_delay: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

impl GitLabArgs {
    /// Merges flags over the config file. Without a project there is nothing
    /// to connect to, so no settings are produced.
    fn settings(&self, config: &GitLabConfig) -> Option<GitLabSettings> {
        let project = self.project.clone().or_else(|| config.project.clone())?;

        Some(GitLabSettings {
            base_url: self.url.clone().unwrap_or_else(|| config.base_url.clone()),
            project,
            token: self
                .token
                .as_deref()
                .or(config.token.as_deref())
                .map(Token::from),
            max_retries: self.max_retries.unwrap_or(config.max_retries),
            retry_delay: Duration::from_secs(self.retry_delay.unwrap_or(config.retry_delay_secs)),
            timeout: Duration::from_secs(self.timeout.unwrap_or(config.timeout_secs)),
        })
    }
}

impl Cli {
    fn emit<T: Serialize>(
        &self,
        value: &T,
        format: OutputFormat,
        pretty: bool,
        print_summary: fn(&T),
    ) -> Result<()> {
        if format == OutputFormat::Summary && self.output.is_none() {
            print_summary(value);
            return Ok(());
        }

        let json_output = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)
                .with_context(|| format!("Failed to write output: {}", output_path.display()))?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        match &self.command {
            Commands::Render { source, gitlab } => {
                let settings = gitlab.settings(&config.gitlab);
                let orchestrator = Orchestrator::new(settings.as_ref())?;

                let rendering = orchestrator
                    .render(source)
                    .await
                    .with_context(|| format!("Failed to render {source}"))?;

                self.emit(&rendering, format, pretty, output::print_rendering)
            }
            Commands::Compare {
                baseline,
                candidate,
                gitlab,
            } => {
                let settings = gitlab.settings(&config.gitlab);
                let orchestrator = Orchestrator::new(settings.as_ref())?;

                let comparison = orchestrator
                    .compare(baseline, candidate)
                    .await
                    .with_context(|| format!("Failed to compare {baseline} with {candidate}"))?;

                self.emit(&comparison, format, pretty, output::print_comparison)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare_command() {
        let cli = Cli::try_parse_from([
            "cidiff",
            "compare",
            "baseline.json",
            "1234",
            "--project",
            "group/project",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Compare {
                baseline,
                candidate,
                gitlab,
            } => {
                assert_eq!(baseline, JobSource::File(PathBuf::from("baseline.json")));
                assert_eq!(candidate, JobSource::Pipeline(1234));
                assert_eq!(gitlab.project.as_deref(), Some("group/project"));
            }
            Commands::Render { .. } => panic!("expected compare command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = GitLabConfig {
            token: Some("from-config".to_string()),
            project: Some("config/project".to_string()),
            ..GitLabConfig::default()
        };
        let args = GitLabArgs {
            token: Some("from-flag".to_string()),
            max_retries: Some(0),
            ..GitLabArgs::default()
        };

        let settings = args.settings(&config).unwrap();

        assert_eq!(settings.project, "config/project");
        assert_eq!(settings.token, Some(Token::from("from-flag")));
        assert_eq!(settings.base_url, "https://gitlab.com");
        assert_eq!(settings.max_retries, 0);
        assert_eq!(settings.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_no_project_means_no_gitlab_settings() {
        let settings = GitLabArgs::default().settings(&GitLabConfig::default());
        assert!(settings.is_none());
    }
}
