use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for cidiff.
///
/// Holds the GitLab connection defaults and output preferences so they do not
/// have to be repeated on every run. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// GitLab connection used to read pipeline sources
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab personal access token
    pub token: Option<String>,

    /// GitLab instance base URL
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,

    /// GitLab project id or path (e.g., 'group/project')
    pub project: Option<String>,

    /// Retries for rate-limited, failed or unreachable requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between retries
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_gitlab_base_url(),
            project: None,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gitlab_base_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

const CANDIDATES: [&str; 4] = ["cidiff.toml", "cidiff.json", "cidiff.yaml", "cidiff.yml"];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./cidiff.toml, ./cidiff.json, ./cidiff.yaml, ./cidiff.yml
    /// 3. `<user config dir>/cidiff/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let found = Self::discover(Path::new(".")).or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("cidiff").join("config.toml"))
                .filter(|path| path.exists())
        });

        match found {
            Some(path) => {
                log::debug!("Using config file: {}", path.display());
                Self::load_from_path(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Returns the first candidate config file present in `dir`.
    fn discover(dir: &Path) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .find(|path| path.exists())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gitlab.base_url, "https://gitlab.com");
        assert_eq!(config.gitlab.max_retries, 3);
        assert_eq!(config.gitlab.retry_delay_secs, 5);
        assert_eq!(config.gitlab.timeout_secs, 30);
        assert!(config.gitlab.project.is_none());
        assert_eq!(config.output.format, OutputFormat::Summary);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gitlab]
token = "glpat-test-token"
base-url = "https://gitlab.example.com"
project = "group/project"
max-retries = 10

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{toml_content}").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.token, Some("glpat-test-token".to_string()));
        assert_eq!(config.gitlab.base_url, "https://gitlab.example.com");
        assert_eq!(config.gitlab.project.as_deref(), Some("group/project"));
        assert_eq!(config.gitlab.max_retries, 10);
        assert_eq!(config.gitlab.timeout_secs, 30);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "gitlab": {
    "token": "glpat-json-token",
    "base-url": "https://gitlab.json.com",
    "retry-delay-secs": 1
  },
  "output": {
    "format": "summary"
  }
}"#;
        write!(temp_file, "{json_content}").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.token, Some("glpat-json-token".to_string()));
        assert_eq!(config.gitlab.base_url, "https://gitlab.json.com");
        assert_eq!(config.gitlab.retry_delay_secs, 1);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(
            temp_file,
            "gitlab:\n  project: \"17\"\n  timeout-secs: 5\noutput:\n  pretty: true\n"
        )
        .unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gitlab.project.as_deref(), Some("17"));
        assert_eq!(config.gitlab.timeout_secs, 5);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/cidiff.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_discover_prefers_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("cidiff.yaml"), "gitlab: {}\n").unwrap();
        std::fs::write(
            temp_dir.path().join("cidiff.toml"),
            "[gitlab]\nproject = \"group/project\"\n",
        )
        .unwrap();

        let found = Config::discover(temp_dir.path()).unwrap();
        assert_eq!(found, temp_dir.path().join("cidiff.toml"));

        let config = Config::load(Some(&found)).unwrap();
        assert_eq!(config.gitlab.project.as_deref(), Some("group/project"));
    }

    #[test]
    fn test_discover_finds_nothing_in_empty_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(temp_dir.path()).is_none());
    }
}
