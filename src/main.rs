use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;

mod config;
mod controller;
mod digest;
mod email;
mod history;
mod poll;
mod remote;
mod schedule;
mod send;
mod service;
mod telemetry;
mod util;
mod watch;

#[derive(Parser)]
#[command(name = "digest", about = "AI news digest console CLI")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Send(send::SendCmd),
    History(history::HistoryCmd),
    Watch(watch::WatchCmd),
    Schedule(schedule::ScheduleCmd),
    Email(email::EmailCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and DIGEST_LOG_FORMAT
    telemetry::config::init_tracing();

    let svc = Arc::new(service::DigestService::from_env()?);

    match cli.command {
        Commands::Send(args) => send::run(&svc, args).await?,
        Commands::History(args) => history::run(&svc, args).await?,
        Commands::Watch(args) => watch::run(Arc::clone(&svc), args).await?,
        Commands::Schedule(args) => schedule::run(&svc, args).await?,
        Commands::Email(args) => email::run(&svc, args)?,
    }

    Ok(())
}
