pub mod retry;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AppConfig, AuthMethod};
use crate::model::issue::Issue;

/// Retrieval failure: a non-2xx response, or a transport-level error
/// reported with status code -1.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{message}:{status}")]
    Status { status: u16, message: String },
    #[error("{0}:-1")]
    Transport(String),
}

impl FetchError {
    pub fn status_code(&self) -> i32 {
        match self {
            FetchError::Status { status, .. } => i32::from(*status),
            FetchError::Transport(_) => -1,
        }
    }

    /// 4xx responses are terminal except 401 and 429; everything else,
    /// transport failures included, is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                status / 100 != 4 || *status == 401 || *status == 429
            }
            FetchError::Transport(_) => true,
        }
    }
}

/// Seam between the pipeline and the HTTP layer; lets tests substitute a
/// scripted source.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn fetch_issues_page(&self, offset: u32, limit: u32) -> Result<Vec<Issue>, FetchError>;
}

pub struct BacklogClient {
    base_uri: String,
    api_key: String,
    project_id: u64,
    client: reqwest::Client,
}

impl BacklogClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.auth_method == AuthMethod::Oauth2 {
            warn!(
                has_access_token = config.access_token.is_some(),
                "oauth2 is configured but the bearer token flow is not implemented; \
                 requests authenticate with the api_key query parameter"
            );
        }

        let timeout = config.retry_policy().http_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_uri: config.uri.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            project_id: config.project_id,
            client,
        })
    }
}

#[async_trait]
impl IssueSource for BacklogClient {
    async fn fetch_issues_page(&self, offset: u32, limit: u32) -> Result<Vec<Issue>, FetchError> {
        let url = format!("{}/api/v2/issues", self.base_uri);
        let response = self
            .client
            .get(&url)
            .query(&[("projectId[]", self.project_id.to_string())])
            .query(&[("offset", offset.to_string()), ("count", limit.to_string())])
            // Both auth methods authenticate through this query parameter.
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: extract_error_messages(&body),
            });
        }

        let records: Vec<Value> =
            serde_json::from_str(&body).map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!(offset, limit, fetched = records.len(), "fetched issues page");

        Ok(records.into_iter().map(Issue::new).collect())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
}

/// Error bodies carry an `errors` array of messages; anything else is passed
/// through verbatim.
fn extract_error_messages(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(" , "),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn config() -> AppConfig {
        AppConfig {
            api_key: "secret".to_string(),
            uri: "https://example.backlog.com/".to_string(),
            project_id: 45687,
            ..AppConfig::default()
        }
    }

    #[test]
    fn client_builds_from_config() {
        let client = BacklogClient::new(&config()).expect("client should build");
        assert_eq!(client.base_uri, "https://example.backlog.com");
        assert_eq!(client.project_id, 45687);
    }

    #[test]
    fn base_uri_trailing_slash_is_trimmed() {
        let client = BacklogClient::new(&config()).unwrap();
        assert!(!client.base_uri.ends_with('/'));
    }

    #[test]
    fn extracts_error_messages_from_errors_array() {
        let body = r#"{"errors":[{"message":"No project."},{"message":"Authentication failure."}]}"#;
        assert_eq!(
            extract_error_messages(body),
            "No project. , Authentication failure."
        );
    }

    #[test]
    fn single_error_message_has_no_separator() {
        let body = r#"{"errors":[{"message":"No project."}]}"#;
        assert_eq!(extract_error_messages(body), "No project.");
    }

    #[test]
    fn non_json_error_body_is_used_verbatim() {
        assert_eq!(extract_error_messages("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn malformed_errors_array_falls_back_to_raw_body() {
        let body = r#"{"errors":"broken"}"#;
        assert_eq!(extract_error_messages(body), body);
    }

    #[test]
    fn status_error_display_includes_code_and_message() {
        let err = FetchError::Status {
            status: 404,
            message: "No project.".to_string(),
        };
        assert_eq!(err.to_string(), "No project.:404");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn transport_error_reports_minus_one() {
        let err = FetchError::Transport("connection refused".to_string());
        assert_eq!(err.status_code(), -1);
        assert_eq!(err.to_string(), "connection refused:-1");
    }

    #[test]
    fn retryability_follows_the_status_class() {
        let status = |status: u16| FetchError::Status {
            status,
            message: String::new(),
        };

        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(401).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(FetchError::Transport("timed out".to_string()).is_retryable());
    }
}
