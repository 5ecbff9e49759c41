//! Single-writer snapshot channel observed by the UI and the idle runtime.

use tokio::sync::watch;

use crate::PlaybackSnapshot;

/// Holds the process-wide playback snapshot.
///
/// Clones share the same channel. Only the synchronizer publishes; every
/// other holder subscribes or reads `current`.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    sender: watch::Sender<PlaybackSnapshot>,
}

impl SnapshotPublisher {
    /// Start with the idle placeholder snapshot.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(PlaybackSnapshot::default());
        Self { sender }
    }

    /// Replace the whole snapshot in one step, with or without live observers.
    pub fn publish(&self, snapshot: PlaybackSnapshot) {
        self.sender.send_replace(snapshot);
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> PlaybackSnapshot {
        self.sender.borrow().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.sender.borrow().is_playing
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
