use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use crate::digest::DigestEntry;
use crate::service::DigestService;
use crate::telemetry::ops::send::Phase as SendPhase;
use crate::telemetry::{self};
use crate::util::time::display_instant;

/// digest send
#[derive(Args)]
pub struct SendCmd {
    /// Override the configured recipient for this send
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Serialize)]
struct SendResult<'a> {
    entry: &'a DigestEntry,
}

pub async fn run(svc: &DigestService, args: SendCmd) -> Result<()> {
    let log = telemetry::send();
    let _g = log.root_span_kv([("to", format!("{:?}", args.to))]).entered();

    let _s = log.span(&SendPhase::Invoke).entered();
    match svc.send_now(args.to.as_deref()).await {
        Ok(entry) => {
            log.info(format!(
                "✅ Digest sent — subject={} recipient={} stories={}",
                entry.subject, entry.recipient, entry.stories_count
            ));
            log.info(format!("   at {}", display_instant(&entry.timestamp)));
            if telemetry::config::json_mode() {
                log.result(&SendResult { entry: &entry })?;
            }
            Ok(())
        }
        Err(err) => {
            log.error(format!("❌ Send failed: {err}"));
            bail!("{err}");
        }
    }
}
