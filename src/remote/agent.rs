use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{RemoteConfig, RemoteError};

/// Result of one agent invocation. The response body is an unstructured
/// string; the normalizer owns its interpretation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InvokeOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn invoke(&self, prompt: &str, agent_id: &str) -> Result<InvokeOutcome, RemoteError>;
}

#[derive(Clone)]
pub struct HttpAgentClient {
    http: HttpClient,
    cfg: RemoteConfig,
}

impl HttpAgentClient {
    pub fn new(cfg: RemoteConfig) -> Result<Self, RemoteError> {
        Url::parse(&cfg.base_url).map_err(|_| RemoteError::InvalidBaseUrl(cfg.base_url.clone()))?;
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(RemoteError::http)?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self, agent_id: &str) -> String {
        format!("{}/agents/{}/invoke", self.cfg.base_url.trim_end_matches('/'), agent_id)
    }
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    prompt: &'a str,
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn invoke(&self, prompt: &str, agent_id: &str) -> Result<InvokeOutcome, RemoteError> {
        if agent_id.is_empty() {
            return Err(RemoteError::MissingAgentId);
        }

        let mut request = self
            .http
            .post(self.endpoint(agent_id))
            .json(&InvokeRequest { prompt });
        if let Some(key) = &self.cfg.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(RemoteError::http)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(RemoteError::http)?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&bytes).into_owned();
            return Err(RemoteError::Api { status, message });
        }

        serde_json::from_slice(&bytes).map_err(RemoteError::Decode)
    }
}

/// Test double with queued outcomes and a recorded call log.
#[derive(Default)]
pub struct MockAgentClient {
    responses: Mutex<VecDeque<Result<InvokeOutcome, RemoteError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockAgentClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, resp: Result<InvokeOutcome, RemoteError>) {
        self.responses.lock().unwrap().push_back(resp);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for MockAgentClient {
    async fn invoke(&self, prompt: &str, agent_id: &str) -> Result<InvokeOutcome, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), agent_id.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::MockQueueEmpty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_decodes_error_shape() {
        let out: InvokeOutcome =
            serde_json::from_str(r#"{"success":false,"error":"agent offline"}"#).unwrap();
        assert!(!out.success);
        assert_eq!(out.error.as_deref(), Some("agent offline"));
        assert!(out.response.is_none());
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let mut cfg = RemoteConfig::default();
        cfg.base_url = "http://example.test/api/".to_string();
        let client = HttpAgentClient::new(cfg).unwrap();
        assert_eq!(client.endpoint("a1"), "http://example.test/api/agents/a1/invoke");
    }

    #[tokio::test]
    async fn mock_returns_enqueued_outcome_and_records_call() {
        let mock = MockAgentClient::new();
        mock.push_response(Ok(InvokeOutcome {
            success: true,
            response: Some("{}".into()),
            error: None,
        }));

        let out = mock.invoke("do it", "a1").await.unwrap();
        assert!(out.success);
        assert_eq!(mock.calls(), vec![("do it".to_string(), "a1".to_string())]);

        let err = mock.invoke("again", "a1").await.unwrap_err();
        assert!(matches!(err, RemoteError::MockQueueEmpty));
    }
}
