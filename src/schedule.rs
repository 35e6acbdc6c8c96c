use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::controller::{ScheduleState, ScheduleStatus, ToggleAction};
use crate::service::DigestService;
use crate::telemetry::ops::schedule::Phase as SchedulePhase;
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::schedule::Schedule;
use crate::util::time::display_instant;

/// digest schedule status/toggle
#[derive(Args)]
pub struct ScheduleCmd {
    #[command(subcommand)]
    pub cmd: ScheduleSub,
}

#[derive(Subcommand)]
pub enum ScheduleSub {
    // refresh and print the authoritative schedule state
    Status,
    // pause when active, resume when paused, then refetch
    Toggle,
}

#[derive(Serialize)]
struct ScheduleResult {
    state: ScheduleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<ToggleAction>,
}

pub async fn run(svc: &DigestService, args: ScheduleCmd) -> Result<()> {
    let log = telemetry::schedule();
    let _g = log.root_span().entered();
    match args.cmd {
        ScheduleSub::Status => status(svc).await?,
        ScheduleSub::Toggle => toggle(svc).await?,
    }
    Ok(())
}

async fn status(svc: &DigestService) -> Result<()> {
    let log = telemetry::schedule();
    let _s = log.span(&SchedulePhase::Refresh).entered();
    let state = svc.refresh_schedule().await;
    print_state(&log, &state);
    if telemetry::config::json_mode() {
        log.result(&ScheduleResult { state, action: None })?;
    }
    Ok(())
}

async fn toggle(svc: &DigestService) -> Result<()> {
    let log = telemetry::schedule();

    // the toggle needs a known starting state
    {
        let _s = log.span(&SchedulePhase::Refresh).entered();
        svc.refresh_schedule().await;
    }

    let _s = log.span(&SchedulePhase::Toggle).entered();
    let action = svc.toggle_schedule().await;
    match action {
        ToggleAction::Paused => log.info("⏸️ Schedule paused"),
        ToggleAction::Resumed => log.info("▶️ Schedule resumed"),
        ToggleAction::Skipped => log.warn("↩️ Toggle skipped (state unknown or already in flight)"),
    }

    let state = svc.schedule_state();
    print_state(&log, &state);
    if telemetry::config::json_mode() {
        log.result(&ScheduleResult { state, action: Some(action) })?;
    }
    Ok(())
}

fn print_state(log: &LogCtx<Schedule>, state: &ScheduleState) {
    let status = match state.status {
        ScheduleStatus::Active => "active",
        ScheduleStatus::Paused => "paused",
        ScheduleStatus::Unknown => "unknown",
    };
    log.info(format!(
        "📅 Schedule {} — status={} cron={}",
        state.id.as_deref().unwrap_or("--"),
        status,
        state.cron_expression.as_deref().unwrap_or("--")
    ));
    if let Some(next) = &state.next_run_time {
        log.info(format!("   next run {}", display_instant(next)));
    }
}
