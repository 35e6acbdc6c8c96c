use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::service::DigestService;
use crate::telemetry::ops::email::Phase as EmailPhase;
use crate::telemetry::{self};

/// digest email set/show/clear
#[derive(Args)]
pub struct EmailCmd {
    #[command(subcommand)]
    pub cmd: EmailSub,
}

#[derive(Subcommand)]
pub enum EmailSub {
    // validate and persist the recipient address
    Set { address: String },
    // print the configured recipient
    Show,
    // remove the persisted recipient
    Clear,
}

#[derive(Serialize)]
struct EmailResult {
    recipient: Option<String>,
    saved: bool,
}

pub fn run(svc: &DigestService, args: EmailCmd) -> Result<()> {
    let log = telemetry::email();
    let _g = log.root_span().entered();
    match args.cmd {
        EmailSub::Set { address } => {
            let _s = log.span(&EmailPhase::Set).entered();
            if !svc.save_email(&address) {
                log.error(format!("❌ Invalid email address: {address}"));
                bail!("invalid email address");
            }
            log.info(format!("✅ Recipient saved: {address}"));
        }
        EmailSub::Show => {
            let _s = log.span(&EmailPhase::Show).entered();
            match svc.email().current() {
                Some(addr) => log.info(format!("📧 Recipient: {addr}")),
                None => log.info("📧 No recipient configured"),
            }
        }
        EmailSub::Clear => {
            let _s = log.span(&EmailPhase::Clear).entered();
            if svc.email().clear() {
                log.info("🧹 Recipient cleared");
            } else {
                log.warn("⚠️ Recipient store unavailable; nothing cleared");
            }
        }
    }

    if telemetry::config::json_mode() {
        let result = EmailResult {
            recipient: svc.email().current(),
            saved: svc.email().just_saved(),
        };
        log.result(&result)?;
    }
    Ok(())
}
