use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub mod agent;
pub mod scheduler;

const DEFAULT_BASE_URL: &str = "http://localhost:8787/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Connection settings for the agent platform, read from the environment
/// (dotenv is loaded in main).
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub agent_id: String,
    pub schedule_id: Option<String>,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: std::env::var("DIGEST_API_KEY").ok(),
            agent_id: std::env::var("DIGEST_AGENT_ID").unwrap_or_default(),
            schedule_id: std::env::var("DIGEST_SCHEDULE_ID").ok(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("DIGEST_BASE_URL") {
            cfg.base_url = base;
        }
        if let Ok(timeout) = std::env::var("DIGEST_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

/// One remote schedule as reported by the listing endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub cron_expression: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub next_run_time: Option<String>,
}

/// One row of the remote execution log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionLog {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub executed_at: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response_output: Option<String>,
}

#[derive(Debug)]
pub enum RemoteError {
    MissingAgentId,
    InvalidBaseUrl(String),
    Http(reqwest::Error),
    Timeout,
    Api { status: StatusCode, message: String },
    Rejected(String),
    Decode(serde_json::Error),
    MockQueueEmpty,
}

impl RemoteError {
    pub(crate) fn http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Http(err)
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout => true,
            RemoteError::Http(_) => true,
            RemoteError::Api { status, .. } => status.is_server_error(),
            RemoteError::MissingAgentId
            | RemoteError::InvalidBaseUrl(_)
            | RemoteError::Rejected(_)
            | RemoteError::Decode(_)
            | RemoteError::MockQueueEmpty => false,
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::MissingAgentId => write!(f, "DIGEST_AGENT_ID is not set"),
            RemoteError::InvalidBaseUrl(url) => write!(f, "invalid base url: {url}"),
            RemoteError::Http(err) => write!(f, "http error: {err}"),
            RemoteError::Timeout => write!(f, "request timed out"),
            RemoteError::Api { status, message } => write!(f, "api error {status}: {message}"),
            RemoteError::Rejected(what) => write!(f, "remote rejected {what}"),
            RemoteError::Decode(err) => write!(f, "decode error: {err}"),
            RemoteError::MockQueueEmpty => write!(f, "mock client response queue is empty"),
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteError::Http(err) => Some(err),
            RemoteError::Decode(err) => Some(err),
            _ => None,
        }
    }
}
