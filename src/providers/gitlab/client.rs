use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{CIDiffError, Result};

const MAX_CONCURRENT_REQUESTS: usize = 8;
pub(super) const PAGE_SIZE: usize = 100;

/// Connection settings for a GitLab instance.
///
/// Built once from CLI flags and the config file, then handed to the client.
/// Nothing here changes after construction.
#[derive(Debug, Clone)]
pub struct GitLabSettings {
    /// GitLab instance base URL (e.g., <https://gitlab.com>)
    pub base_url: String,
    /// Numeric project id or full path (e.g., "group/project")
    pub project: String,
    pub token: Option<Token>,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

/// A decoded response body plus the `x-next-page` pagination header.
pub(super) struct Page<T> {
    pub body: T,
    pub next_page: Option<String>,
}

pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
    max_retries: u32,
    retry_delay: Duration,
    semaphore: Arc<Semaphore>,
}

impl GitLabClient {
    pub fn new(settings: &GitLabSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cidiff/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CIDiffError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(&settings.base_url)?;
        api_url
            .path_segments_mut()
            .map_err(|()| CIDiffError::Config(format!("Invalid base URL: {}", settings.base_url)))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        Ok(Self {
            client,
            api_url,
            token: settings.token.clone(),
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Builds `<api>/projects/<project>/<segments...>`.
    ///
    /// The project is pushed as a single path segment, so a path such as
    /// `group/project` is sent percent-encoded as GitLab expects.
    pub(super) fn project_url(&self, project: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| CIDiffError::Config(format!("Invalid API base URL: {}", self.api_url)))?
            .pop_if_empty()
            .push("projects")
            .push(project)
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request with automatic retry on network errors, rate limits
    /// and server errors. Any other non-success status is returned as an error.
    pub(super) async fn get_json<T>(&self, url: Url) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| CIDiffError::Config(format!("Request limiter closed: {e}")))?;

        let mut retry_count = 0;
        loop {
            debug!("GET {url}");
            let request = self.auth_request(self.client.get(url.clone()));

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= self.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {}s ({}/{})...",
                        e,
                        self.retry_delay.as_secs(),
                        retry_count + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= self.max_retries {
                    return Err(CIDiffError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: self.max_retries,
                    });
                }

                warn!(
                    "GitLab API error (status {status}). Waiting {} seconds before retry {}/{}...",
                    self.retry_delay.as_secs(),
                    retry_count + 1,
                    self.max_retries
                );

                tokio::time::sleep(self.retry_delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(CIDiffError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string);

            let bytes = response.bytes().await?;
            let body = serde_json::from_slice(&bytes)?;

            return Ok(Page { body, next_page });
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn settings(base_url: &str) -> GitLabSettings {
        GitLabSettings {
            base_url: base_url.to_string(),
            project: "17".to_string(),
            token: Some(Token::from("glpat-test")),
            max_retries: 2,
            retry_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::settings;
    use super::*;

    #[test]
    fn test_project_url_encodes_project_path() {
        let client = GitLabClient::new(&settings("https://gitlab.example.com")).unwrap();

        let url = client
            .project_url("group/project", &["pipelines", "42", "jobs"])
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fproject/pipelines/42/jobs"
        );
    }

    #[test]
    fn test_project_url_with_numeric_project() {
        let client = GitLabClient::new(&settings("http://localhost:8080")).unwrap();

        let url = client.project_url("17", &["pipelines", "5"]).unwrap();

        assert_eq!(url.as_str(), "http://localhost:8080/api/v4/projects/17/pipelines/5");
    }

    #[test]
    fn test_project_url_keeps_base_sub_path() {
        for base_url in ["http://host/gitlab", "http://host/gitlab/"] {
            let client = GitLabClient::new(&settings(base_url)).unwrap();

            let url = client.project_url("17", &["pipelines", "5"]).unwrap();

            assert_eq!(url.as_str(), "http://host/gitlab/api/v4/projects/17/pipelines/5");
        }
    }

    #[test]
    fn test_non_hierarchical_base_url_is_rejected() {
        let result = GitLabClient::new(&settings("mailto:ops@example.com"));
        assert!(matches!(result, Err(CIDiffError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_retried_then_surfaced() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut unreachable = settings(&format!("http://{addr}"));
        unreachable.timeout = Duration::from_millis(500);
        let client = GitLabClient::new(&unreachable).unwrap();
        let url = client.project_url("17", &["pipelines", "5"]).unwrap();

        let started = std::time::Instant::now();
        let result = client.get_json::<serde_json::Value>(url).await;

        match result {
            Err(CIDiffError::Network(e)) => assert!(e.is_connect() || e.is_timeout()),
            Err(other) => panic!("expected network error, got {other:?}"),
            Ok(_) => panic!("expected network error"),
        }
        // Three attempts, each bounded by the request timeout.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_slow_response_hits_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut slow = settings(&format!("http://{addr}"));
        slow.timeout = Duration::from_millis(100);
        slow.max_retries = 1;
        let client = GitLabClient::new(&slow).unwrap();
        let url = client.project_url("17", &["pipelines", "5"]).unwrap();

        let result = client.get_json::<serde_json::Value>(url).await;
        server.abort();

        match result {
            Err(CIDiffError::Network(e)) => assert!(e.is_timeout()),
            Err(other) => panic!("expected timeout, got {other:?}"),
            Ok(_) => panic!("expected timeout"),
        }
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = GitLabClient::new(&settings("not a url"));
        assert!(matches!(result, Err(CIDiffError::Url(_))));
    }
}
