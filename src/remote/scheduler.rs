use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use url::Url;

use super::{ExecutionLog, RemoteConfig, RemoteError, Schedule};

/// Schedule listing, pause/resume, and execution-log endpoints. Pause and
/// resume acks are carried through but callers must not treat them as
/// authoritative; only a fresh listing is.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    async fn list(&self, agent_id: &str) -> Result<Vec<Schedule>, RemoteError>;
    async fn pause(&self, schedule_id: &str) -> Result<bool, RemoteError>;
    async fn resume(&self, schedule_id: &str) -> Result<bool, RemoteError>;
    async fn executions(
        &self,
        schedule_id: &str,
        limit: usize,
    ) -> Result<Vec<ExecutionLog>, RemoteError>;
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    schedules: Vec<Schedule>,
}

#[derive(Deserialize)]
struct LogsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    executions: Vec<ExecutionLog>,
}

#[derive(Deserialize)]
struct AckEnvelope {
    #[serde(default)]
    ok: bool,
}

#[derive(Clone)]
pub struct HttpSchedulerClient {
    http: HttpClient,
    cfg: RemoteConfig,
}

impl HttpSchedulerClient {
    pub fn new(cfg: RemoteConfig) -> Result<Self, RemoteError> {
        Url::parse(&cfg.base_url).map_err(|_| RemoteError::InvalidBaseUrl(cfg.base_url.clone()))?;
        let http = HttpClient::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(RemoteError::http)?;
        Ok(Self { http, cfg })
    }

    fn base(&self) -> &str {
        self.cfg.base_url.trim_end_matches('/')
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, RemoteError> {
        let mut request = self.http.get(url);
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

    async fn post_ack(&self, url: String) -> Result<bool, RemoteError> {
        let mut request = self.http.post(url);
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
        let ack: AckEnvelope = serde_json::from_slice(&bytes).unwrap_or(AckEnvelope { ok: true });
        Ok(ack.ok)
    }
}

#[async_trait]
impl SchedulerClient for HttpSchedulerClient {
    async fn list(&self, agent_id: &str) -> Result<Vec<Schedule>, RemoteError> {
        if agent_id.is_empty() {
            return Err(RemoteError::MissingAgentId);
        }
        let url = format!("{}/schedules?agent_id={}", self.base(), agent_id);
        let envelope: ListEnvelope = self.get_json(url).await?;
        if !envelope.success {
            return Err(RemoteError::Rejected("schedule listing".to_string()));
        }
        Ok(envelope.schedules)
    }

    async fn pause(&self, schedule_id: &str) -> Result<bool, RemoteError> {
        self.post_ack(format!("{}/schedules/{}/pause", self.base(), schedule_id)).await
    }

    async fn resume(&self, schedule_id: &str) -> Result<bool, RemoteError> {
        self.post_ack(format!("{}/schedules/{}/resume", self.base(), schedule_id)).await
    }

    async fn executions(
        &self,
        schedule_id: &str,
        limit: usize,
    ) -> Result<Vec<ExecutionLog>, RemoteError> {
        let url = format!(
            "{}/schedules/{}/executions?limit={}",
            self.base(),
            schedule_id,
            limit
        );
        let envelope: LogsEnvelope = self.get_json(url).await?;
        if !envelope.success {
            return Err(RemoteError::Rejected("execution log fetch".to_string()));
        }
        Ok(envelope.executions)
    }
}

/// Test double with per-endpoint queues and a recorded call log.
#[derive(Default)]
pub struct MockSchedulerClient {
    list_responses: Mutex<VecDeque<Result<Vec<Schedule>, RemoteError>>>,
    pause_responses: Mutex<VecDeque<Result<bool, RemoteError>>>,
    resume_responses: Mutex<VecDeque<Result<bool, RemoteError>>>,
    executions_responses: Mutex<VecDeque<Result<Vec<ExecutionLog>, RemoteError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockSchedulerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, resp: Result<Vec<Schedule>, RemoteError>) {
        self.list_responses.lock().unwrap().push_back(resp);
    }

    pub fn push_pause(&self, resp: Result<bool, RemoteError>) {
        self.pause_responses.lock().unwrap().push_back(resp);
    }

    pub fn push_resume(&self, resp: Result<bool, RemoteError>) {
        self.resume_responses.lock().unwrap().push_back(resp);
    }

    pub fn push_executions(&self, resp: Result<Vec<ExecutionLog>, RemoteError>) {
        self.executions_responses.lock().unwrap().push_back(resp);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SchedulerClient for MockSchedulerClient {
    async fn list(&self, agent_id: &str) -> Result<Vec<Schedule>, RemoteError> {
        self.record(format!("list:{agent_id}"));
        self.list_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::MockQueueEmpty))
    }

    async fn pause(&self, schedule_id: &str) -> Result<bool, RemoteError> {
        self.record(format!("pause:{schedule_id}"));
        self.pause_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::MockQueueEmpty))
    }

    async fn resume(&self, schedule_id: &str) -> Result<bool, RemoteError> {
        self.record(format!("resume:{schedule_id}"));
        self.resume_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::MockQueueEmpty))
    }

    async fn executions(
        &self,
        schedule_id: &str,
        limit: usize,
    ) -> Result<Vec<ExecutionLog>, RemoteError> {
        self.record(format!("executions:{schedule_id}:{limit}"));
        self.executions_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::MockQueueEmpty))
    }
}
