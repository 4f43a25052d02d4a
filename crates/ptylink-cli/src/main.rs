//! `ptylink`: run one interactive session, or manage the host whitelist.

mod admin;
mod cli;
mod logging;

use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use ptylink_config::reconcile;
use ptylink_core::{SignalContext, run_session};
use ptylink_disc::{MetricsSource, serve_http_metrics};
use ptylink_pty::PtyTransport;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};

/// Gauges for the running session.
struct SessionMetrics {
    started: Instant,
    active: AtomicBool,
}

impl SessionMetrics {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            active: AtomicBool::new(false),
        }
    }
}

impl MetricsSource for SessionMetrics {
    fn render(&self) -> String {
        format!(
            "# TYPE ptylink_session_active gauge\n\
             ptylink_session_active {}\n\
             # TYPE ptylink_uptime_seconds gauge\n\
             ptylink_uptime_seconds {}\n",
            u8::from(self.active.load(Ordering::Relaxed)),
            self.started.elapsed().as_secs(),
        )
    }
}

async fn run_command(cli: &Cli) -> Result<ExitCode> {
    let conf = reconcile(&cli.confpath)
        .with_context(|| format!("Failed to load {}", cli.confpath.display()))?;
    let endpoint = conf
        .config
        .cli_endpoint(cli.clinet.as_deref(), cli.cliaddr.as_deref());
    tracing::debug!(
        net = %endpoint.net,
        addr = %endpoint.addr,
        outcome = ?conf.outcome,
        "Configuration loaded"
    );

    let root = CancellationToken::new();
    let ctx = SignalContext::derive(&root, &[]).context("Failed to register signal handlers")?;

    let metrics = Arc::new(SessionMetrics::new());
    let server = serve_http_metrics(&cli.metrics, Arc::clone(&metrics) as Arc<dyn MetricsSource>)
        .await?;

    metrics.active.store(true, Ordering::Relaxed);
    let transport = PtyTransport::new().with_endpoint(endpoint.net, endpoint.addr);
    let result = run_session(&transport, &ctx, &cli.session_request()).await;
    metrics.active.store(false, Ordering::Relaxed);

    if let Some(reason) = ctx.reason() {
        tracing::debug!(?reason, "Session context cancelled");
    }
    ctx.cancel();
    ctx.join().await;
    if let Some(server) = server {
        server.abort();
    }

    let exit = result.context("Session failed")?;
    Ok(ExitCode::from(exit.process_code()))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        None => run_command(&cli).await,
        Some(Command::Whitelist) => {
            println!("{}", admin::list(&cli.confpath)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::WhitelistAdd { keys }) => {
            admin::add(&cli.confpath, keys)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::WhitelistRemove { keys }) => {
            admin::remove(&cli.confpath, keys)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Config) => {
            println!("{}", admin::show_config(&cli.confpath)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
