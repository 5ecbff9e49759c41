//! Select, bind, normalize, and publish the active media session.
//!
//! All session-state mutation goes through one `Synchronizer`, owned by a
//! single event loop, so a rebind can never interleave with a normalize
//! against the binding it replaced.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::util::log_snippet;
use crate::{
    normalize, select, AccessGate, PlaybackSnapshot, RawSessionState, SessionCandidate,
    SessionHost, SessionTrigger, SnapshotPublisher, TransportCommand,
};

/// The one live listener registration and the session it observes.
struct ActiveBinding<H: SessionHost> {
    session: H::Session,
    _listener: H::Listener,
}

pub struct Synchronizer<H: SessionHost> {
    host: H,
    access: Arc<AccessGate>,
    publisher: SnapshotPublisher,
    binding: Option<ActiveBinding<H>>,
}

impl<H: SessionHost> Synchronizer<H> {
    pub fn new(host: H, access: Arc<AccessGate>, publisher: SnapshotPublisher) -> Self {
        Self {
            host,
            access,
            publisher,
            binding: None,
        }
    }

    pub fn bound_session(&self) -> Option<&H::Session> {
        self.binding.as_ref().map(|binding| &binding.session)
    }

    /// Query the directory. Missing access and host failures both yield an
    /// empty list; the next lifecycle event re-queries.
    pub async fn list_active_sessions(&self) -> Vec<SessionCandidate<H::Session>> {
        if !self.access.is_granted() {
            debug!("session access not granted; treating directory as empty");
            return Vec::new();
        }
        match self.host.list_sessions().await {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(?err, "failed to query media sessions");
                Vec::new()
            }
        }
    }

    /// Re-run selection against a fresh directory query.
    pub async fn refresh(&mut self) {
        let candidates = self.list_active_sessions().await;
        debug!(count = candidates.len(), "media sessions listed");
        let selected = select(candidates);
        self.rebind(selected).await;
    }

    /// Replace the active binding.
    ///
    /// The previous listener is released before a new one is registered, on
    /// every path. Binding always publishes once from the session's current
    /// state, even when the same session is bound again.
    ///
    /// Clearing the binding with `None` leaves the last snapshot published,
    /// `is_playing` included. A player that exits mid-track therefore keeps
    /// the display from terminating until the next selection; this is
    /// intended and must not be reset to the idle snapshot here.
    pub async fn rebind(&mut self, candidate: Option<SessionCandidate<H::Session>>) {
        if let Some(previous) = self.binding.take() {
            debug!(session = ?previous.session, "released media session binding");
        }

        let Some(candidate) = candidate else {
            debug!("no media session to observe");
            return;
        };

        let listener = match self.host.subscribe(&candidate.session).await {
            Ok(listener) => listener,
            Err(err) => {
                warn!(?err, session = ?candidate.session, "failed to subscribe to media session");
                return;
            }
        };
        info!(
            session = ?candidate.session,
            status = %candidate.status,
            "bound media session"
        );
        self.binding = Some(ActiveBinding {
            session: candidate.session,
            _listener: listener,
        });
        self.publish_current().await;
    }

    /// React to a change notification raised by `source`'s listener.
    ///
    /// Notifications queued by a listener that has since been released are
    /// dropped; the binding that replaced it already published.
    pub async fn on_session_changed(&mut self, source: &H::Session, trigger: SessionTrigger) {
        if self.bound_session() != Some(source) {
            debug!(session = ?source, ?trigger, "ignoring change from released binding");
            return;
        }
        debug!(?trigger, "bound media session changed");
        self.publish_current().await;
    }

    /// Forward a transport command to the bound session, if any.
    pub async fn transport(&mut self, command: TransportCommand) {
        let Some(binding) = self.binding.as_ref() else {
            debug!(?command, "no bound media session; transport command ignored");
            return;
        };
        let command = command.resolve(self.publisher.is_playing());
        if let Err(err) = self.host.send_command(&binding.session, command).await {
            warn!(?err, ?command, "media transport command failed");
            return;
        }
        debug!(?command, "media transport command sent");
        self.publish_current().await;
    }

    async fn publish_current(&self) {
        let Some(binding) = self.binding.as_ref() else {
            return;
        };
        let raw = match self.host.read_state(&binding.session).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(?err, session = ?binding.session, "failed to read media session state");
                RawSessionState::default()
            }
        };
        let snapshot: PlaybackSnapshot = normalize(raw);
        debug!(
            title = %log_snippet(&snapshot.title),
            artist = %log_snippet(&snapshot.artist),
            playing = snapshot.is_playing,
            "publishing playback snapshot"
        );
        self.publisher.publish(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::{PlaybackStatus, SessionError};

    #[derive(Default)]
    struct FakeState {
        sessions: Vec<SessionCandidate<u32>>,
        states: HashMap<u32, RawSessionState>,
        fail_listing: bool,
        fail_subscribe: bool,
        listings: usize,
        reads: Vec<u32>,
        live_listeners: usize,
        peak_listeners: usize,
        commands: Vec<(u32, TransportCommand)>,
    }

    #[derive(Clone, Default)]
    struct FakeHost {
        state: Arc<Mutex<FakeState>>,
    }

    struct FakeListener {
        state: Arc<Mutex<FakeState>>,
    }

    impl Drop for FakeListener {
        fn drop(&mut self) {
            let mut state = self.state.lock().expect("fake state");
            state.live_listeners -= 1;
        }
    }

    impl FakeHost {
        fn with(&self, apply: impl FnOnce(&mut FakeState)) {
            apply(&mut self.state.lock().expect("fake state"));
        }

        fn read<T>(&self, read: impl FnOnce(&FakeState) -> T) -> T {
            read(&self.state.lock().expect("fake state"))
        }
    }

    impl SessionHost for FakeHost {
        type Session = u32;
        type Listener = FakeListener;

        async fn list_sessions(&self) -> Result<Vec<SessionCandidate<u32>>, SessionError> {
            let mut state = self.state.lock().expect("fake state");
            state.listings += 1;
            if state.fail_listing {
                return Err(SessionError::Unavailable("bus went away".to_string()));
            }
            Ok(state.sessions.clone())
        }

        async fn subscribe(&self, _session: &u32) -> Result<FakeListener, SessionError> {
            let mut state = self.state.lock().expect("fake state");
            if state.fail_subscribe {
                return Err(SessionError::Unavailable("player vanished".to_string()));
            }
            state.live_listeners += 1;
            state.peak_listeners = state.peak_listeners.max(state.live_listeners);
            Ok(FakeListener {
                state: self.state.clone(),
            })
        }

        async fn read_state(&self, session: &u32) -> Result<RawSessionState, SessionError> {
            let mut state = self.state.lock().expect("fake state");
            state.reads.push(*session);
            Ok(state.states.get(session).cloned().unwrap_or_default())
        }

        async fn send_command(
            &self,
            session: &u32,
            command: TransportCommand,
        ) -> Result<(), SessionError> {
            let mut state = self.state.lock().expect("fake state");
            state.commands.push((*session, command));
            Ok(())
        }
    }

    fn titled(title: &str, status: PlaybackStatus) -> RawSessionState {
        RawSessionState {
            title: Some(title.to_string()),
            artist: Some("Artist".to_string()),
            status,
            ..RawSessionState::default()
        }
    }

    fn synchronizer(host: &FakeHost, granted: bool) -> (Synchronizer<FakeHost>, SnapshotPublisher) {
        let publisher = SnapshotPublisher::new();
        let sync = Synchronizer::new(
            host.clone(),
            Arc::new(AccessGate::new(granted)),
            publisher.clone(),
        );
        (sync, publisher)
    }

    #[tokio::test]
    async fn no_session_keeps_idle_snapshot() {
        let host = FakeHost::default();
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.refresh().await;
        assert!(sync.bound_session().is_none());
        assert_eq!(publisher.current(), PlaybackSnapshot::default());
    }

    #[tokio::test]
    async fn refresh_binds_playing_session_and_publishes() {
        let host = FakeHost::default();
        host.with(|state| {
            state.sessions = vec![
                SessionCandidate::new(1, PlaybackStatus::Paused),
                SessionCandidate::new(2, PlaybackStatus::Playing),
            ];
            state.states.insert(1, titled("Paused Song", PlaybackStatus::Paused));
            state.states.insert(2, titled("Live Song", PlaybackStatus::Playing));
        });
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.refresh().await;
        assert_eq!(sync.bound_session(), Some(&2));
        let snapshot = publisher.current();
        assert_eq!(snapshot.title, "Live Song");
        assert!(snapshot.is_playing);
    }

    #[tokio::test]
    async fn missing_access_lists_nothing_without_querying_host() {
        let host = FakeHost::default();
        host.with(|state| {
            state.sessions = vec![SessionCandidate::new(1, PlaybackStatus::Playing)];
        });
        let (mut sync, publisher) = synchronizer(&host, false);
        sync.refresh().await;
        assert!(sync.bound_session().is_none());
        assert_eq!(host.read(|state| state.listings), 0);
        assert!(publisher.current().is_idle_placeholder());
    }

    #[tokio::test]
    async fn access_is_checked_on_every_query() {
        let host = FakeHost::default();
        host.with(|state| {
            state.sessions = vec![SessionCandidate::new(4, PlaybackStatus::Playing)];
        });
        let access = Arc::new(AccessGate::new(false));
        let mut sync = Synchronizer::new(host.clone(), access.clone(), SnapshotPublisher::new());
        sync.refresh().await;
        assert!(sync.bound_session().is_none());

        access.set(true);
        sync.refresh().await;
        assert_eq!(sync.bound_session(), Some(&4));
    }

    #[tokio::test]
    async fn query_failure_degrades_to_empty() {
        let host = FakeHost::default();
        host.with(|state| state.fail_listing = true);
        let (sync, _publisher) = synchronizer(&host, true);
        assert!(sync.list_active_sessions().await.is_empty());
        assert_eq!(host.read(|state| state.listings), 1);
    }

    #[tokio::test]
    async fn rebinding_same_session_publishes_each_time() {
        let host = FakeHost::default();
        host.with(|state| {
            state.states.insert(7, titled("Again", PlaybackStatus::Paused));
        });
        let (mut sync, publisher) = synchronizer(&host, true);
        let mut receiver = publisher.subscribe();

        sync.rebind(Some(SessionCandidate::new(7, PlaybackStatus::Paused)))
            .await;
        assert_eq!(host.read(|state| state.reads.clone()), vec![7]);
        assert!(receiver.has_changed().expect("publisher alive"));
        receiver.borrow_and_update();

        sync.rebind(Some(SessionCandidate::new(7, PlaybackStatus::Paused)))
            .await;
        assert_eq!(host.read(|state| state.reads.clone()), vec![7, 7]);
        assert!(receiver.has_changed().expect("publisher alive"));
    }

    #[tokio::test]
    async fn at_most_one_listener_is_live() {
        let host = FakeHost::default();
        let (mut sync, _publisher) = synchronizer(&host, true);
        for session in [1, 2, 2, 3, 1] {
            sync.rebind(Some(SessionCandidate::new(session, PlaybackStatus::Playing)))
                .await;
            assert_eq!(host.read(|state| state.live_listeners), 1);
        }
        assert_eq!(host.read(|state| state.peak_listeners), 1);

        sync.rebind(None).await;
        assert_eq!(host.read(|state| state.live_listeners), 0);
        assert!(sync.bound_session().is_none());
    }

    #[tokio::test]
    async fn failed_subscribe_still_releases_previous_binding() {
        let host = FakeHost::default();
        let (mut sync, _publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(1, PlaybackStatus::Playing)))
            .await;
        host.with(|state| state.fail_subscribe = true);
        sync.rebind(Some(SessionCandidate::new(2, PlaybackStatus::Playing)))
            .await;
        assert!(sync.bound_session().is_none());
        assert_eq!(host.read(|state| state.live_listeners), 0);
    }

    #[tokio::test]
    async fn clearing_binding_keeps_last_snapshot() {
        let host = FakeHost::default();
        host.with(|state| {
            state.states.insert(5, titled("Last Heard", PlaybackStatus::Paused));
        });
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(5, PlaybackStatus::Paused)))
            .await;
        sync.rebind(None).await;
        assert_eq!(publisher.current().title, "Last Heard");

        sync.on_session_changed(&5, SessionTrigger::Metadata).await;
        assert_eq!(host.read(|state| state.reads.len()), 1);
    }

    #[tokio::test]
    async fn untitled_session_publishes_unknown_title() {
        let host = FakeHost::default();
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(9, PlaybackStatus::Playing)))
            .await;
        let snapshot = publisher.current();
        assert_eq!(snapshot.title, "Unknown Title");
        assert_eq!(snapshot.artist, "Unknown Artist");
    }

    #[tokio::test]
    async fn either_trigger_republishes_bound_session() {
        let host = FakeHost::default();
        host.with(|state| {
            state.states.insert(3, titled("First", PlaybackStatus::Playing));
        });
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(3, PlaybackStatus::Playing)))
            .await;

        host.with(|state| {
            state.states.insert(3, titled("Second", PlaybackStatus::Playing));
        });
        sync.on_session_changed(&3, SessionTrigger::Metadata).await;
        assert_eq!(publisher.current().title, "Second");

        host.with(|state| {
            state.states.insert(3, titled("Second", PlaybackStatus::Paused));
        });
        sync.on_session_changed(&3, SessionTrigger::Playback).await;
        assert!(!publisher.current().is_playing);
    }

    #[tokio::test]
    async fn change_from_replaced_session_is_dropped() {
        let host = FakeHost::default();
        host.with(|state| {
            state.states.insert(1, titled("Old", PlaybackStatus::Paused));
            state.states.insert(2, titled("New", PlaybackStatus::Playing));
        });
        let (mut sync, publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(1, PlaybackStatus::Paused)))
            .await;
        sync.rebind(Some(SessionCandidate::new(2, PlaybackStatus::Playing)))
            .await;
        let mut receiver = publisher.subscribe();
        receiver.borrow_and_update();

        host.with(|state| {
            state.states.insert(1, titled("Stale", PlaybackStatus::Paused));
        });
        sync.on_session_changed(&1, SessionTrigger::Metadata).await;

        assert_eq!(host.read(|state| state.reads.clone()), vec![1, 2]);
        assert!(!receiver.has_changed().expect("publisher alive"));
        assert_eq!(publisher.current().title, "New");
        assert!(publisher.current().is_playing);
    }

    #[tokio::test]
    async fn reselection_switches_without_stickiness() {
        let host = FakeHost::default();
        host.with(|state| {
            state.sessions = vec![
                SessionCandidate::new(1, PlaybackStatus::Playing),
                SessionCandidate::new(2, PlaybackStatus::Paused),
            ];
        });
        let (mut sync, _publisher) = synchronizer(&host, true);
        sync.refresh().await;
        assert_eq!(sync.bound_session(), Some(&1));

        host.with(|state| {
            state.sessions = vec![
                SessionCandidate::new(1, PlaybackStatus::Paused),
                SessionCandidate::new(2, PlaybackStatus::Buffering),
            ];
        });
        sync.refresh().await;
        assert_eq!(sync.bound_session(), Some(&2));
    }

    #[tokio::test]
    async fn transport_without_binding_is_noop() {
        let host = FakeHost::default();
        let (mut sync, _publisher) = synchronizer(&host, true);
        sync.transport(TransportCommand::Next).await;
        assert!(host.read(|state| state.commands.is_empty()));
    }

    #[tokio::test]
    async fn toggle_resolves_against_published_state() {
        let host = FakeHost::default();
        host.with(|state| {
            state.states.insert(6, titled("Groove", PlaybackStatus::Playing));
        });
        let (mut sync, _publisher) = synchronizer(&host, true);
        sync.rebind(Some(SessionCandidate::new(6, PlaybackStatus::Playing)))
            .await;
        sync.transport(TransportCommand::TogglePlayback).await;
        sync.transport(TransportCommand::Previous).await;
        assert_eq!(
            host.read(|state| state.commands.clone()),
            vec![(6, TransportCommand::Pause), (6, TransportCommand::Previous)]
        );
    }
}
