//! Command-line control surface for the ambiplay D-Bus interface.

use ambiplay_core::{ControlProxy, DisplayView, SnapshotView};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures_util::StreamExt;
use serde::Serialize;
use zbus::Connection;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current snapshot and display state
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Report a user interaction (wakes a dimmed display)
    Interact,
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    /// Re-query the media session directory
    Refresh,
    Access {
        #[arg(value_enum)]
        state: AccessState,
    },
    /// Follow snapshot and display signals until termination
    Watch,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AccessState {
    Grant,
    Revoke,
    Status,
}

#[derive(Serialize)]
struct StatusReport {
    authorized: bool,
    snapshot: SnapshotView,
    display: DisplayView,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let connection = Connection::session()
        .await
        .context("connect to session bus")?;
    let proxy = ControlProxy::new(&connection)
        .await
        .context("connect to ambiplay control interface")?;

    match args.command {
        Command::Status { json } => {
            let report = StatusReport {
                authorized: proxy.has_authorization().await?,
                snapshot: proxy.get_snapshot().await?,
                display: proxy.get_display().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_status(&report);
            }
        }
        Command::Interact => proxy.interact().await?,
        Command::Play => proxy.play().await?,
        Command::Pause => proxy.pause().await?,
        Command::Toggle => proxy.toggle_playback().await?,
        Command::Next => proxy.next().await?,
        Command::Previous => proxy.previous().await?,
        Command::Refresh => proxy.refresh().await?,
        Command::Access { state } => match state {
            AccessState::Grant => proxy.set_access(true).await?,
            AccessState::Revoke => proxy.set_access(false).await?,
            AccessState::Status => {
                let granted = proxy.has_authorization().await?;
                println!("session access: {}", if granted { "granted" } else { "revoked" });
            }
        },
        Command::Watch => watch(&proxy).await?,
    }

    Ok(())
}

async fn watch(proxy: &ControlProxy<'_>) -> Result<()> {
    let mut snapshots = proxy
        .receive_snapshot_changed()
        .await
        .context("subscribe to snapshot_changed")?;
    let mut displays = proxy
        .receive_display_changed()
        .await
        .context("subscribe to display_changed")?;
    let mut terminations = proxy
        .receive_termination_requested()
        .await
        .context("subscribe to termination_requested")?;

    print_snapshot(&proxy.get_snapshot().await?);
    loop {
        tokio::select! {
            signal = snapshots.next() => {
                let Some(signal) = signal else {
                    break;
                };
                if let Ok(args) = signal.args() {
                    print_snapshot(args.snapshot());
                }
            }
            signal = displays.next() => {
                let Some(signal) = signal else {
                    break;
                };
                if let Ok(args) = signal.args() {
                    print_display(args.display());
                }
            }
            signal = terminations.next() => {
                if signal.is_some() {
                    println!("display terminated");
                }
                break;
            }
        }
    }
    Ok(())
}

fn print_status(report: &StatusReport) {
    if !report.authorized {
        println!("session access not granted; run `ambiplayctl access grant`");
    }
    print_snapshot(&report.snapshot);
    print_display(&report.display);
}

fn print_snapshot(snapshot: &SnapshotView) {
    let state = if snapshot.is_playing { "playing" } else { "stopped" };
    println!(
        "{title} - {artist} [{state}] {position}/{duration}",
        title = snapshot.title,
        artist = snapshot.artist,
        position = format_ms(snapshot.position_ms),
        duration = format_ms(snapshot.duration_ms),
    );
}

fn print_display(display: &DisplayView) {
    println!(
        "display: {state:?} (overlay {opacity:.2}, since {since} ms)",
        state = display.state,
        opacity = display.overlay_opacity,
        since = display.since_ms,
    );
}

fn format_ms(value: u64) -> String {
    let seconds = value / 1_000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
