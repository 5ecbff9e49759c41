//! Session synchronizer runtime.
//!
//! One event loop owns the synchronizer, so directory queries, rebinding,
//! normalizing, and publishing are processed one event at a time.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ambiplay_core::{AccessGate, SessionsConfig, SnapshotPublisher, Synchronizer, TransportCommand};
use futures_util::StreamExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use zbus::fdo::DBusProxy;
use zbus::Connection;

use crate::mpris::{
    is_mpris_name, is_playback_status_change, playback_status_changes, MprisHost, MprisSession,
    SessionSignal,
};

#[derive(Debug, Clone)]
pub enum SessionCommand {
    Refresh,
    Transport(TransportCommand),
    Shutdown,
}

/// Cheap handle for sending commands into the session runtime.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub fn refresh(&self) {
        let _ = self.command_tx.send(SessionCommand::Refresh);
    }

    pub fn transport(&self, command: TransportCommand) {
        let _ = self.command_tx.send(SessionCommand::Transport(command));
    }
}

pub struct SessionRuntime {
    handle: SessionHandle,
    thread: thread::JoinHandle<()>,
}

impl SessionRuntime {
    /// Spawn the runtime on its own thread with a current-thread executor.
    pub fn start(
        config: SessionsConfig,
        access: Arc<AccessGate>,
        publisher: SnapshotPublisher,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let thread = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    warn!(?err, "failed to initialize session runtime");
                    return;
                }
            };
            runtime.block_on(run_session_loop(config, access, publisher, command_rx));
        });

        Self {
            handle: SessionHandle { command_tx },
            thread,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stop the loop, releasing the active binding, and wait briefly for it.
    pub async fn shutdown(self, timeout: Duration) {
        let _ = self.handle.command_tx.send(SessionCommand::Shutdown);
        let thread = self.thread;
        let joined = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || thread.join()),
        )
        .await;
        if joined.is_err() {
            warn!("session runtime did not stop in time");
        }
    }
}

async fn run_session_loop(
    config: SessionsConfig,
    access: Arc<AccessGate>,
    publisher: SnapshotPublisher,
    mut command_rx: UnboundedReceiver<SessionCommand>,
) {
    let connection = match Connection::session().await {
        Ok(connection) => connection,
        Err(err) => {
            warn!(?err, "failed to connect to session bus for media sessions");
            return;
        }
    };

    let dbus_proxy = match DBusProxy::new(&connection).await {
        Ok(proxy) => proxy,
        Err(err) => {
            warn!(?err, "failed to create D-Bus proxy for media sessions");
            return;
        }
    };

    let mut owner_stream = match dbus_proxy.receive_name_owner_changed().await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(?err, "failed to subscribe to name owner changes");
            return;
        }
    };

    let mut status_stream = match playback_status_changes(&connection).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(?err, "failed to subscribe to player status changes");
            return;
        }
    };

    // Listener notifications stay on this loop so they serialize with rebinds.
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<SessionSignal>();
    let host = MprisHost::new(connection.clone(), dbus_proxy.clone(), config, signal_tx);
    let mut sync = Synchronizer::new(host, access, publisher);
    sync.refresh().await;
    info!("media session runtime started");

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    SessionCommand::Refresh => sync.refresh().await,
                    SessionCommand::Transport(command) => sync.transport(command).await,
                    SessionCommand::Shutdown => break,
                }
            }
            signal = signal_rx.recv() => {
                let Some(signal) = signal else {
                    break;
                };
                let source = MprisSession::new(signal.bus_name);
                sync.on_session_changed(&source, signal.trigger).await;
            }
            signal = owner_stream.next() => {
                let Some(signal) = signal else {
                    break;
                };
                if let Ok(args) = signal.args() {
                    if is_mpris_name(args.name()) {
                        debug!(player = %args.name(), "media player appeared or vanished");
                        sync.refresh().await;
                    }
                }
            }
            message = status_stream.next() => {
                let Some(message) = message else {
                    break;
                };
                match message {
                    Ok(message) if is_playback_status_change(&message) => sync.refresh().await,
                    Ok(_) => {}
                    Err(err) => debug!(?err, "malformed player status signal"),
                }
            }
        }
    }

    // Dropping the synchronizer releases the active binding.
    drop(sync);
    info!("media session runtime stopped");
}
