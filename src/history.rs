use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::digest::{DigestEntry, DigestSource};
use crate::remote::DEFAULT_LOG_LIMIT;
use crate::service::DigestService;
use crate::telemetry::ops::history::Phase as HistoryPhase;
use crate::telemetry::{self};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::history::History;
use crate::util::time::display_instant;

/// digest history ls
#[derive(Args)]
pub struct HistoryCmd {
    #[command(subcommand)]
    pub cmd: HistorySub,
}

#[derive(Subcommand)]
pub enum HistorySub {
    // print the reconciled digest feed
    Ls {
        /// Bound on the execution-log snapshot size
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct FeedView {
    entries: Vec<DigestEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(svc: &DigestService, args: HistoryCmd) -> Result<()> {
    let log = telemetry::history();
    match args.cmd {
        HistorySub::Ls { limit } => ls(svc, limit, &log).await?,
    }
    Ok(())
}

async fn ls(svc: &DigestService, limit: usize, log: &LogCtx<History>) -> Result<()> {
    let _g = log.root_span_kv([("limit", limit.to_string())]).entered();

    {
        let _s = log.span(&HistoryPhase::FetchLogs).entered();
        if let Err(err) = svc.refresh_history(limit).await {
            log.warn(format!("⚠️ {err}"));
        }
    }

    let _s = log.span(&HistoryPhase::Render).entered();
    print_feed(svc, log)?;
    Ok(())
}

pub fn print_feed(svc: &DigestService, log: &LogCtx<History>) -> Result<()> {
    let entries = svc.entries();
    let error = svc.history_error();

    if let Some(msg) = &error {
        log.warn(format!("⚠️ {msg}"));
    }
    if entries.is_empty() {
        log.info("📭 No digests yet");
    } else {
        log.info("🗞️ Digest feed:");
        for e in &entries {
            let tag = match e.source {
                DigestSource::Manual => "manual",
                DigestSource::Scheduled => "scheduled",
            };
            log.info(format!(
                "[{}] {} ({}) to={} stories={} status={} sent={}",
                display_instant(&e.timestamp),
                e.subject,
                tag,
                if e.recipient.is_empty() { "--" } else { &e.recipient },
                e.stories_count,
                e.workflow_status,
                e.email_sent
            ));
        }
    }

    if telemetry::config::json_mode() {
        log.result(&FeedView { entries, error })?;
    }
    Ok(())
}
