use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::warn;

use crate::remote::{Schedule, scheduler::SchedulerClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Unknown,
    Active,
    Paused,
}

/// Local mirror of one remote schedule. Only `refresh` writes it; a toggle
/// never updates fields from its own ack.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleState {
    pub status: ScheduleStatus,
    pub id: Option<String>,
    pub cron_expression: Option<String>,
    pub next_run_time: Option<String>,
}

impl ScheduleState {
    pub fn unknown() -> Self {
        Self { status: ScheduleStatus::Unknown, id: None, cron_expression: None, next_run_time: None }
    }

    fn from_schedule(s: &Schedule) -> Self {
        Self {
            status: if s.is_active { ScheduleStatus::Active } else { ScheduleStatus::Paused },
            id: Some(s.id.clone()),
            cron_expression: Some(s.cron_expression.clone()),
            next_run_time: s.next_run_time.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Paused,
    Resumed,
    Skipped,
}

pub struct ScheduleController {
    client: Arc<dyn SchedulerClient>,
    agent_id: String,
    schedule_id: Option<String>,
    state: Mutex<ScheduleState>,
    busy: AtomicBool,
}

impl ScheduleController {
    pub fn new(
        client: Arc<dyn SchedulerClient>,
        agent_id: String,
        schedule_id: Option<String>,
    ) -> Self {
        Self {
            client,
            agent_id,
            schedule_id,
            state: Mutex::new(ScheduleState::unknown()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state.lock().unwrap().clone()
    }

    /// Re-list schedules and adopt the authoritative state. A failed listing
    /// keeps the last known state; an empty one resets to unknown.
    pub async fn refresh(&self) {
        match self.client.list(&self.agent_id).await {
            Ok(schedules) => {
                let next = match self.select(&schedules) {
                    Some(found) => ScheduleState::from_schedule(found),
                    None => ScheduleState::unknown(),
                };
                *self.state.lock().unwrap() = next;
            }
            Err(err) => {
                warn!(error = %err, "schedule refresh failed; keeping last known state");
            }
        }
    }

    fn select<'a>(&self, schedules: &'a [Schedule]) -> Option<&'a Schedule> {
        if let Some(want) = &self.schedule_id {
            if let Some(found) = schedules.iter().find(|s| &s.id == want) {
                return Some(found);
            }
            if !schedules.is_empty() {
                warn!(
                    schedule_id = %want,
                    "configured schedule not in listing; controlling first returned schedule"
                );
            }
        }
        schedules.first()
    }

    /// Pause when active, resume when paused, then unconditionally refresh.
    /// The mutation ack is not trusted; only the re-listing is. No-op while a
    /// toggle is already in flight or while state is unknown.
    pub async fn toggle(&self) -> ToggleAction {
        if self.busy.swap(true, Ordering::SeqCst) {
            return ToggleAction::Skipped;
        }

        let (status, id) = {
            let st = self.state.lock().unwrap();
            (st.status, st.id.clone())
        };

        let action = match (status, id) {
            (ScheduleStatus::Active, Some(id)) => {
                if let Err(err) = self.client.pause(&id).await {
                    warn!(error = %err, "pause call failed; relying on refetch");
                }
                ToggleAction::Paused
            }
            (ScheduleStatus::Paused, Some(id)) => {
                if let Err(err) = self.client.resume(&id).await {
                    warn!(error = %err, "resume call failed; relying on refetch");
                }
                ToggleAction::Resumed
            }
            _ => {
                self.busy.store(false, Ordering::SeqCst);
                return ToggleAction::Skipped;
            }
        };

        self.refresh().await;
        self.busy.store(false, Ordering::SeqCst);
        action
    }

    #[cfg(test)]
    fn force_busy(&self) {
        self.busy.store(true, Ordering::SeqCst);
    }
}
