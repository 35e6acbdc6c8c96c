use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::history::print_feed;
use crate::poll::{DEFAULT_PERIOD, PollingLoop};
use crate::service::DigestService;
use crate::telemetry::ops::watch::Phase as WatchPhase;
use crate::telemetry::{self};

/// digest watch
#[derive(Args)]
pub struct WatchCmd {
    /// Poll period in seconds
    #[arg(long, default_value_t = DEFAULT_PERIOD.as_secs())]
    pub period: u64,
}

pub async fn run(svc: Arc<DigestService>, args: WatchCmd) -> Result<()> {
    let log = telemetry::watch();
    let _g = log.root_span_kv([("period", args.period.to_string())]).entered();

    {
        let _s = log.span(&WatchPhase::Start).entered();
        let state = svc.refresh_schedule().await;
        log.info(format!(
            "👀 Watching digest feed (period={}s, schedule={}). Ctrl-C to stop.",
            args.period,
            state.id.as_deref().unwrap_or("--")
        ));
    }

    let poll = PollingLoop::spawn(Arc::clone(&svc), Duration::from_secs(args.period));
    tokio::signal::ctrl_c().await?;

    let _s = log.span(&WatchPhase::Teardown).entered();
    poll.shutdown().await;
    log.info("🛑 Watch stopped");

    // final reconciled view on the way out
    print_feed(&svc, &telemetry::history())?;
    Ok(())
}
