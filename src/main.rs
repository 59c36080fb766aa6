mod config;
mod engine;
mod github;
mod logs;
mod server;
mod types;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use crate::config::Config;
use crate::server::{ServerContext, WebhookHandler, WebhookServer};

/// GitHub App that enforces authorized pull request review approvals.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Arg {
    /// Path to the TOML config file. When omitted, configuration comes
    /// from REVIEWBOT_* environment variables and defaults.
    #[clap(long, short)]
    config: Option<String>,

    /// Number of server workers. Defaults to the actix default.
    #[clap(long)]
    workers: Option<usize>,
}

async fn run() -> Result<()> {
    let arg = Arg::parse();

    let cfg = Config::load(arg.config.as_deref()).context("load config")?;
    logs::init(&cfg.log_level)?;
    debug!("Use config: {cfg:?}");

    let handler = WebhookHandler::new(&cfg).context("init webhook handler")?;
    let ctx = Arc::new(ServerContext {
        webhook_handler: handler,
    });

    let mut server = WebhookServer::new(cfg.bind.clone(), ctx);
    if let Some(workers) = arg.workers {
        server.set_workers(workers);
    }

    server.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            _ = writeln!(io::stderr(), "Fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}
