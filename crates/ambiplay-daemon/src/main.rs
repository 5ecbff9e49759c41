//! Daemon entrypoint and service bootstrap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;
use zbus::Connection;

mod control;
mod idle_runtime;
mod mpris;
mod runtime_config;
mod session_runtime;
mod shutdown_signal;

use crate::control::{request_control_name, spawn_signal_forwarder, ControlServer, DaemonState};
use crate::idle_runtime::IdleRuntime;
use crate::runtime_config::{config_source, init_tracing, load_config};
use crate::session_runtime::SessionRuntime;
use crate::shutdown_signal::{shutdown_signal, ShutdownReason};
use ambiplay_core::{
    AccessGate, InteractionClock, SnapshotPublisher, CONTROL_BUS_NAME, CONTROL_OBJECT_PATH,
};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(1_000);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args).context("load config")?;

    init_tracing(&config);
    info!(config_source = config_source(&args), "configuration loaded");
    if ambiplay_core::util::diagnostic_mode() {
        info!(
            limit = ambiplay_core::util::log_limit(),
            "diagnostic logging enabled (snippets capped; newlines stripped)"
        );
    }

    if args.check {
        info!("configuration loaded successfully");
        return Ok(());
    }

    let connection = Connection::session()
        .await
        .context("connect to session bus")?;

    let access = Arc::new(AccessGate::new(config.sessions.access_granted));
    let publisher = SnapshotPublisher::new();
    let clock = Arc::new(InteractionClock::new());

    let idle = IdleRuntime::start(&config.idle, clock, publisher.subscribe());
    let session = SessionRuntime::start(config.sessions.clone(), access.clone(), publisher.clone());
    let state = DaemonState::new(
        access,
        publisher.clone(),
        session.handle(),
        idle.handle(),
        idle.subscribe(),
    );

    connection
        .object_server()
        .at(CONTROL_OBJECT_PATH, ControlServer::new(state))
        .await?;

    let reply = request_control_name(&connection).await?;
    match reply {
        zbus::fdo::RequestNameReply::PrimaryOwner => {
            info!(name = CONTROL_BUS_NAME, "acquired control bus name");
        }
        zbus::fdo::RequestNameReply::AlreadyOwner => {
            info!(name = CONTROL_BUS_NAME, "already owns control bus name");
        }
        _ => {
            return Err(anyhow!(
                "control bus name is already owned; another ambiplay instance may be running"
            ));
        }
    }

    let forwarder = spawn_signal_forwarder(connection.clone(), publisher.subscribe(), idle.subscribe());

    info!("ambiplay-daemon running");
    let reason = shutdown_signal(idle.subscribe(), config.idle.exit_on_terminate).await;
    info!(?reason, "shutting down");

    if reason == ShutdownReason::DisplaySlept {
        // Let the termination signal reach the bus before exiting.
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, forwarder).await;
    } else {
        forwarder.abort();
    }
    drop(idle);
    session.shutdown(SHUTDOWN_GRACE).await;

    Ok(())
}
