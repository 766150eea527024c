use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::client::retry::RetryPolicy;
use crate::schema::ColumnConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AuthMethod {
    #[serde(rename = "api_key")]
    ApiKey,
    #[serde(rename = "oauth2")]
    Oauth2,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub auth_method: AuthMethod,
    pub api_key: String,
    pub access_token: Option<String>,
    pub uri: String,
    pub project_id: u64,
    pub initial_retry_interval_millis: u64,
    pub maximum_retry_interval_millis: u64,
    pub timeout_millis: u64,
    pub retry_limit: u32,
    pub page_size: u32,
    pub dynamic_schema: bool,
    pub columns: Vec<ColumnConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_method: AuthMethod::ApiKey,
            api_key: String::new(),
            access_token: None,
            uri: String::new(),
            project_id: 0,
            initial_retry_interval_millis: 1000,
            maximum_retry_interval_millis: 120_000,
            timeout_millis: 300_000,
            retry_limit: 5,
            page_size: 100,
            dynamic_schema: false,
            columns: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            bail!("`uri` is required (base URI of the issue tracker, e.g. https://yourspace.backlog.com)");
        }
        if self.api_key.is_empty() {
            bail!("`api_key` is required");
        }
        if self.project_id == 0 {
            bail!("`project_id` is required");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_limit: self.retry_limit,
            initial_retry_interval_millis: self.initial_retry_interval_millis,
            maximum_retry_interval_millis: self.maximum_retry_interval_millis,
            timeout_millis: self.timeout_millis,
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".backlog-extract")
        .join("config.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    config.validate()?;
    Ok(config)
}
