//! D-Bus control server and signal forwarding for the display collaborator.

use std::sync::Arc;

use ambiplay_core::{
    AccessGate, DisplayState, DisplayView, PlaybackSnapshot, SnapshotPublisher, SnapshotView,
    TransportCommand, CONTROL_BUS_NAME, CONTROL_OBJECT_PATH,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::fdo::{RequestNameFlags, RequestNameReply};
use zbus::{interface, Connection, SignalContext};

use crate::idle_runtime::IdleHandle;
use crate::session_runtime::SessionHandle;

/// Everything the control surface reads from or forwards to.
pub struct DaemonState {
    access: Arc<AccessGate>,
    publisher: SnapshotPublisher,
    session: SessionHandle,
    idle: IdleHandle,
    display: watch::Receiver<DisplayView>,
}

impl DaemonState {
    pub fn new(
        access: Arc<AccessGate>,
        publisher: SnapshotPublisher,
        session: SessionHandle,
        idle: IdleHandle,
        display: watch::Receiver<DisplayView>,
    ) -> Arc<Self> {
        Arc::new(Self {
            access,
            publisher,
            session,
            idle,
            display,
        })
    }

    /// Transport taps count as interactions on the display.
    fn transport(&self, command: TransportCommand) {
        self.idle.interact();
        self.session.transport(command);
    }
}

/// D-Bus server for io.ambiplay.Control.
pub struct ControlServer {
    state: Arc<DaemonState>,
}

impl ControlServer {
    pub fn new(state: Arc<DaemonState>) -> Self {
        Self { state }
    }
}

#[interface(name = "io.ambiplay.Control")]
impl ControlServer {
    async fn get_snapshot(&self) -> SnapshotView {
        self.state.publisher.current().to_view()
    }

    async fn get_display(&self) -> DisplayView {
        self.state.display.borrow().clone()
    }

    async fn has_authorization(&self) -> bool {
        self.state.access.is_granted()
    }

    async fn set_access(&self, granted: bool) {
        let previous = self.state.access.set(granted);
        if previous != granted {
            info!(granted, "session access changed");
        }
        self.state.session.refresh();
    }

    async fn interact(&self) {
        self.state.idle.interact();
    }

    async fn play(&self) {
        self.state.transport(TransportCommand::Play);
    }

    async fn pause(&self) {
        self.state.transport(TransportCommand::Pause);
    }

    async fn toggle_playback(&self) {
        self.state.transport(TransportCommand::TogglePlayback);
    }

    async fn next(&self) {
        self.state.transport(TransportCommand::Next);
    }

    async fn previous(&self) {
        self.state.transport(TransportCommand::Previous);
    }

    async fn refresh(&self) {
        debug!("session refresh requested");
        self.state.session.refresh();
    }

    #[zbus(signal)]
    async fn snapshot_changed(ctx: &SignalContext<'_>, snapshot: SnapshotView) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn display_changed(ctx: &SignalContext<'_>, display: DisplayView) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn termination_requested(ctx: &SignalContext<'_>) -> zbus::Result<()>;
}

/// Re-emit snapshot and display changes as control signals.
///
/// The task ends after announcing termination.
pub fn spawn_signal_forwarder(
    connection: Connection,
    mut snapshot_rx: watch::Receiver<PlaybackSnapshot>,
    mut display_rx: watch::Receiver<DisplayView>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctx = match SignalContext::new(&connection, CONTROL_OBJECT_PATH) {
            Ok(ctx) => ctx,
            Err(err) => {
                warn!(?err, "failed to create control signal context");
                return;
            }
        };
        loop {
            tokio::select! {
                changed = snapshot_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = snapshot_rx.borrow_and_update().to_view();
                    if let Err(err) = ControlServer::snapshot_changed(&ctx, view).await {
                        warn!(?err, "failed to emit snapshot change");
                    }
                }
                changed = display_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = display_rx.borrow_and_update().clone();
                    let terminated = view.state == DisplayState::Terminated;
                    if let Err(err) = ControlServer::display_changed(&ctx, view).await {
                        warn!(?err, "failed to emit display change");
                    }
                    if terminated {
                        if let Err(err) = ControlServer::termination_requested(&ctx).await {
                            warn!(?err, "failed to emit termination request");
                        }
                        break;
                    }
                }
            }
        }
    })
}

pub async fn request_control_name(connection: &Connection) -> zbus::Result<RequestNameReply> {
    let flags = RequestNameFlags::DoNotQueue;
    connection
        .request_name_with_flags(CONTROL_BUS_NAME, flags.into())
        .await
}
