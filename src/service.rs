use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use crate::config::{EmailConfigStore, FileStore, KvStore};
use crate::controller::{ScheduleController, ScheduleState, ToggleAction};
use crate::digest::reconcile::FeedReconciler;
use crate::digest::{DigestEntry, normalize};
use crate::remote::agent::{AgentClient, HttpAgentClient};
use crate::remote::scheduler::{HttpSchedulerClient, SchedulerClient};
use crate::remote::{DEFAULT_LOG_LIMIT, RemoteConfig};

const SEND_PROMPT: &str = "Search for the latest AI research breakthroughs, new papers, model \
releases, and industry developments. Then compose and send a curated HTML email digest to";

/// Presentation-facing facade: owns the reconciler, schedule controller, and
/// recipient config, and wires them to the remote clients.
pub struct DigestService {
    agent: Arc<dyn AgentClient>,
    scheduler: Arc<dyn SchedulerClient>,
    controller: ScheduleController,
    email: EmailConfigStore,
    reconciler: Mutex<FeedReconciler>,
    history_error: Mutex<Option<String>>,
    agent_id: String,
    schedule_id: Option<String>,
}

impl DigestService {
    pub fn from_env() -> Result<Self> {
        let cfg = RemoteConfig::from_env();
        let agent = Arc::new(HttpAgentClient::new(cfg.clone())?);
        let scheduler = Arc::new(HttpSchedulerClient::new(cfg.clone())?);
        Ok(Self::with_clients(agent, scheduler, cfg, Box::new(FileStore::from_env())))
    }

    pub fn with_clients(
        agent: Arc<dyn AgentClient>,
        scheduler: Arc<dyn SchedulerClient>,
        cfg: RemoteConfig,
        store: Box<dyn KvStore>,
    ) -> Self {
        let controller = ScheduleController::new(
            Arc::clone(&scheduler),
            cfg.agent_id.clone(),
            cfg.schedule_id.clone(),
        );
        Self {
            agent,
            scheduler,
            controller,
            email: EmailConfigStore::new(store),
            reconciler: Mutex::new(FeedReconciler::new()),
            history_error: Mutex::new(None),
            agent_id: cfg.agent_id,
            schedule_id: cfg.schedule_id,
        }
    }

    pub fn entries(&self) -> Vec<DigestEntry> {
        self.reconciler.lock().unwrap().entries().to_vec()
    }

    /// Last history-fetch failure, kept until the next successful refresh.
    pub fn history_error(&self) -> Option<String> {
        self.history_error.lock().unwrap().clone()
    }

    pub fn email(&self) -> &EmailConfigStore {
        &self.email
    }

    pub fn schedule_state(&self) -> ScheduleState {
        self.controller.state()
    }

    pub async fn refresh_schedule(&self) -> ScheduleState {
        self.controller.refresh().await;
        self.controller.state()
    }

    pub async fn toggle_schedule(&self) -> ToggleAction {
        self.controller.toggle().await
    }

    pub fn save_email(&self, candidate: &str) -> bool {
        self.email.save(candidate)
    }

    /// Invoke the agent once and insert the resulting manual entry. Fails
    /// visibly with the remote-provided message (or a generic one).
    pub async fn send_now(&self, to: Option<&str>) -> Result<DigestEntry> {
        let recipient = to
            .map(str::to_string)
            .or_else(|| self.email.current())
            .ok_or_else(|| anyhow!("configure a recipient email first (digest email set ADDR)"))?;

        let prompt = format!("{SEND_PROMPT} {recipient}");
        let outcome = self.agent.invoke(&prompt, &self.agent_id).await?;
        if !outcome.success {
            bail!("{}", outcome.error.unwrap_or_else(|| "failed to send digest".to_string()));
        }

        let parsed = outcome.response.as_deref().and_then(normalize::parse_loose);
        let entry = normalize::manual_entry(parsed, &recipient);
        self.reconciler.lock().unwrap().insert_manual(entry.clone());
        Ok(entry)
    }

    /// Fetch a full execution-log snapshot, normalized for the merge. Records
    /// the history error banner on failure.
    pub async fn fetch_snapshot(&self, limit: usize) -> Result<Vec<DigestEntry>> {
        let schedule_id = match self.resolve_schedule_id().await {
            Some(id) => id,
            None => {
                let msg = "no schedule found for agent".to_string();
                *self.history_error.lock().unwrap() = Some(msg.clone());
                bail!("{msg}");
            }
        };
        match self.scheduler.executions(&schedule_id, limit).await {
            Ok(executions) => {
                debug!(count = executions.len(), "fetched execution log snapshot");
                Ok(normalize::entries_from_executions(&executions))
            }
            Err(err) => {
                *self.history_error.lock().unwrap() =
                    Some("failed to load digest history".to_string());
                Err(err.into())
            }
        }
    }

    /// Replace the scheduled half of the feed and clear the error banner.
    /// Returns the resulting feed size.
    pub fn apply_snapshot(&self, snapshot: Vec<DigestEntry>) -> usize {
        let mut feed = self.reconciler.lock().unwrap();
        feed.merge_scheduled(snapshot);
        *self.history_error.lock().unwrap() = None;
        feed.len()
    }

    pub async fn refresh_history(&self, limit: usize) -> Result<usize> {
        let snapshot = self.fetch_snapshot(limit).await?;
        Ok(self.apply_snapshot(snapshot))
    }

    async fn resolve_schedule_id(&self) -> Option<String> {
        if let Some(id) = &self.schedule_id {
            return Some(id.clone());
        }
        if let Some(id) = self.controller.state().id {
            return Some(id);
        }
        // No configured id and nothing selected yet: one listing round trip.
        self.controller.refresh().await;
        self.controller.state().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemStore;
    use crate::controller::ScheduleStatus;
    use crate::digest::DigestSource;
    use crate::remote::agent::{InvokeOutcome, MockAgentClient};
    use crate::remote::scheduler::MockSchedulerClient;
    use crate::remote::{ExecutionLog, RemoteError, Schedule};

    fn remote_cfg() -> RemoteConfig {
        RemoteConfig {
            base_url: "http://example.test".to_string(),
            api_key: None,
            agent_id: "agent-1".to_string(),
            schedule_id: Some("sched-1".to_string()),
            timeout: std::time::Duration::from_secs(5),
        }
    }

    fn service(
        agent: Arc<MockAgentClient>,
        scheduler: Arc<MockSchedulerClient>,
    ) -> DigestService {
        DigestService::with_clients(agent, scheduler, remote_cfg(), Box::new(MemStore::default()))
    }

    fn exec(id: &str, at: &str, success: bool, output: &str) -> ExecutionLog {
        ExecutionLog {
            id: id.to_string(),
            executed_at: at.to_string(),
            success,
            response_output: Some(output.to_string()),
        }
    }

    #[tokio::test]
    async fn send_now_requires_a_recipient() {
        let svc = service(Arc::new(MockAgentClient::new()), Arc::new(MockSchedulerClient::new()));
        let err = svc.send_now(None).await.unwrap_err();
        assert!(err.to_string().contains("recipient"));
    }

    #[tokio::test]
    async fn send_now_inserts_a_manual_entry() {
        let agent = Arc::new(MockAgentClient::new());
        agent.push_response(Ok(InvokeOutcome {
            success: true,
            response: Some(r#"{"subject":"Fresh digest","stories_count":4}"#.to_string()),
            error: None,
        }));
        let svc = service(Arc::clone(&agent), Arc::new(MockSchedulerClient::new()));
        svc.save_email("reader@example.com");

        let entry = svc.send_now(None).await.unwrap();
        assert_eq!(entry.subject, "Fresh digest");
        assert_eq!(entry.stories_count, 4);
        assert_eq!(entry.source, DigestSource::Manual);
        assert_eq!(entry.recipient, "reader@example.com");
        assert_eq!(svc.entries().len(), 1);

        let (prompt, agent_id) = agent.calls().remove(0);
        assert!(prompt.contains("reader@example.com"));
        assert_eq!(agent_id, "agent-1");
    }

    #[tokio::test]
    async fn send_now_surfaces_the_remote_error_message() {
        let agent = Arc::new(MockAgentClient::new());
        agent.push_response(Ok(InvokeOutcome {
            success: false,
            response: None,
            error: Some("agent offline".to_string()),
        }));
        let svc = service(agent, Arc::new(MockSchedulerClient::new()));
        svc.save_email("reader@example.com");

        let err = svc.send_now(None).await.unwrap_err();
        assert_eq!(err.to_string(), "agent offline");
        assert!(svc.entries().is_empty());
    }

    #[tokio::test]
    async fn send_now_tolerates_unparsable_response() {
        let agent = Arc::new(MockAgentClient::new());
        agent.push_response(Ok(InvokeOutcome {
            success: true,
            response: Some("the agent rambled with no json".to_string()),
            error: None,
        }));
        let svc = service(agent, Arc::new(MockSchedulerClient::new()));

        let entry = svc.send_now(Some("reader@example.com")).await.unwrap();
        assert_eq!(entry.subject, "AI News Digest");
        assert_eq!(entry.workflow_status, "completed");
        assert!(entry.email_sent);
    }

    #[tokio::test]
    async fn history_error_persists_until_next_success() {
        let scheduler = Arc::new(MockSchedulerClient::new());
        scheduler.push_executions(Err(RemoteError::Timeout));
        scheduler.push_executions(Ok(vec![exec("e1", "2026-02-23T08:00:00Z", true, "{}")]));
        let svc = service(Arc::new(MockAgentClient::new()), Arc::clone(&scheduler));

        assert!(svc.refresh_history(DEFAULT_LOG_LIMIT).await.is_err());
        assert_eq!(svc.history_error().as_deref(), Some("failed to load digest history"));

        let n = svc.refresh_history(DEFAULT_LOG_LIMIT).await.unwrap();
        assert_eq!(n, 1);
        assert!(svc.history_error().is_none());
    }

    #[tokio::test]
    async fn resolve_falls_back_to_listing_when_unconfigured() {
        let scheduler = Arc::new(MockSchedulerClient::new());
        scheduler.push_list(Ok(vec![Schedule {
            id: "discovered".to_string(),
            cron_expression: String::new(),
            is_active: true,
            next_run_time: None,
        }]));
        scheduler.push_executions(Ok(vec![]));
        let mut cfg = remote_cfg();
        cfg.schedule_id = None;
        let client: Arc<dyn SchedulerClient> = Arc::clone(&scheduler) as _;
        let svc = DigestService::with_clients(
            Arc::new(MockAgentClient::new()),
            client,
            cfg,
            Box::new(MemStore::default()),
        );

        svc.refresh_history(DEFAULT_LOG_LIMIT).await.unwrap();
        assert_eq!(
            scheduler.calls(),
            vec![
                "list:agent-1".to_string(),
                format!("executions:discovered:{DEFAULT_LOG_LIMIT}"),
            ]
        );
    }

    #[tokio::test]
    async fn end_to_end_scenario_orders_and_filters() {
        // three scheduled executions T1<T2<T3 (T3 failed) plus a manual send
        // at T4>T3: expect [manual@T4, scheduled@T2, scheduled@T1]
        let agent = Arc::new(MockAgentClient::new());
        agent.push_response(Ok(InvokeOutcome {
            success: true,
            response: Some(r#"{"timestamp":"2026-02-23T10:00:00Z","subject":"manual"}"#.to_string()),
            error: None,
        }));
        let scheduler = Arc::new(MockSchedulerClient::new());
        scheduler.push_executions(Ok(vec![
            exec("t1", "2026-02-23T07:00:00Z", true, r#"{"subject":"one"}"#),
            exec("t2", "2026-02-23T08:00:00Z", true, r#"{"subject":"two"}"#),
            exec("t3", "2026-02-23T09:00:00Z", false, r#"{"subject":"three"}"#),
        ]));
        let svc = service(agent, scheduler);

        svc.send_now(Some("reader@example.com")).await.unwrap();
        svc.refresh_history(DEFAULT_LOG_LIMIT).await.unwrap();

        let entries = svc.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].subject, "manual");
        assert_eq!(entries[0].source, DigestSource::Manual);
        assert_eq!(entries[1].id, "t2");
        assert_eq!(entries[2].id, "t1");
        assert!(entries.iter().all(|e| e.id != "t3"));
    }

    #[tokio::test]
    async fn schedule_surface_delegates_to_controller() {
        let scheduler = Arc::new(MockSchedulerClient::new());
        scheduler.push_list(Ok(vec![Schedule {
            id: "sched-1".to_string(),
            cron_expression: "0 8 * * *".to_string(),
            is_active: true,
            next_run_time: Some("2026-02-24T08:00:00Z".to_string()),
        }]));
        let svc = service(Arc::new(MockAgentClient::new()), scheduler);

        assert_eq!(svc.schedule_state().status, ScheduleStatus::Unknown);
        let state = svc.refresh_schedule().await;
        assert_eq!(state.status, ScheduleStatus::Active);
        assert_eq!(state.cron_expression.as_deref(), Some("0 8 * * *"));
    }
}
