//! MPRIS implementation of the session host.
//!
//! Players on the session bus are the host's media sessions. Discovery and
//! listener plumbing live in mpris_bus; metadata decoding in mpris_metadata.

mod mpris_bus;
mod mpris_metadata;

use ambiplay_core::{
    RawSessionState, SessionCandidate, SessionError, SessionHost, SessionTrigger, SessionsConfig,
    TransportCommand,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use zbus::fdo::DBusProxy;
use zbus::Connection;

pub use mpris_bus::{is_mpris_name, is_playback_status_change, playback_status_changes};

// MPRIS identifiers used to discover and address players on the session bus.
const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const MPRIS_PLAYER: &str = "org.mpris.MediaPlayer2.Player";

/// One MPRIS player, addressed by its well-known bus name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MprisSession {
    bus_name: String,
}

impl MprisSession {
    pub fn new(bus_name: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
        }
    }

    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }
}

/// Change notification raised by a bound player's listener.
#[derive(Debug)]
pub struct SessionSignal {
    pub bus_name: String,
    pub trigger: SessionTrigger,
}

/// Live `PropertiesChanged`/`Seeked` subscription on one player.
pub struct PropertiesListener {
    task: JoinHandle<()>,
}

impl Drop for PropertiesListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct MprisHost {
    connection: Connection,
    dbus_proxy: DBusProxy<'static>,
    config: SessionsConfig,
    signal_tx: UnboundedSender<SessionSignal>,
}

impl MprisHost {
    pub fn new(
        connection: Connection,
        dbus_proxy: DBusProxy<'static>,
        config: SessionsConfig,
        signal_tx: UnboundedSender<SessionSignal>,
    ) -> Self {
        Self {
            connection,
            dbus_proxy,
            config,
            signal_tx,
        }
    }
}

impl SessionHost for MprisHost {
    type Session = MprisSession;
    type Listener = PropertiesListener;

    async fn list_sessions(&self) -> Result<Vec<SessionCandidate<MprisSession>>, SessionError> {
        mpris_bus::list_candidates(&self.connection, &self.dbus_proxy, &self.config).await
    }

    async fn subscribe(&self, session: &MprisSession) -> Result<PropertiesListener, SessionError> {
        mpris_bus::subscribe_player(&self.connection, session, self.signal_tx.clone()).await
    }

    async fn read_state(&self, session: &MprisSession) -> Result<RawSessionState, SessionError> {
        mpris_metadata::read_session_state(&self.connection, session.bus_name()).await
    }

    async fn send_command(
        &self,
        session: &MprisSession,
        command: TransportCommand,
    ) -> Result<(), SessionError> {
        mpris_bus::call_transport(&self.connection, session.bus_name(), command).await
    }
}
