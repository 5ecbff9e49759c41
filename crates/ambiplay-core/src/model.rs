//! Playback data model shared by the daemon, the control CLI, and tests.

use std::fmt;

/// Title shown while no session is selected.
pub const IDLE_TITLE: &str = "No Music";
/// Artist line shown while no session is selected.
pub const IDLE_ARTIST: &str = "Select a song";
/// Title used when a selected session does not report one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Artist used when a selected session does not report one.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Transport state reported by a media session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Buffering,
    Stopped,
    Unknown,
}

impl PlaybackStatus {
    /// Map an MPRIS `PlaybackStatus` property value onto the closed variant set.
    pub fn from_mpris(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Idle;
        };
        match value.trim() {
            "" => Self::Idle,
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            "Stopped" => Self::Stopped,
            "Buffering" => Self::Buffering,
            _ => Self::Unknown,
        }
    }

    /// Playing and buffering sessions win selection over everything else.
    pub fn is_selection_preferred(self) -> bool {
        match self {
            Self::Playing | Self::Buffering => true,
            Self::Idle | Self::Paused | Self::Stopped | Self::Unknown => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to album artwork. The renderer resolves and decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtHandle(String);

impl ArtHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Canonical, immutable playback state published to observers.
///
/// `position_ms` is only meaningful against the `duration_ms` of the same
/// snapshot; the two are never updated independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub title: String,
    pub artist: String,
    pub is_playing: bool,
    pub album_art: Option<ArtHandle>,
    pub duration_ms: u64,
    pub position_ms: u64,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            title: IDLE_TITLE.to_string(),
            artist: IDLE_ARTIST.to_string(),
            is_playing: false,
            album_art: None,
            duration_ms: 0,
            position_ms: 0,
        }
    }
}

impl PlaybackSnapshot {
    /// True when this is the "nothing selected" placeholder.
    pub fn is_idle_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

/// Session state exactly as the host reported it, before fallbacks apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSessionState {
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Primary artwork field.
    pub album_art: Option<ArtHandle>,
    /// Secondary artwork field, used when the primary one is absent.
    pub art: Option<ArtHandle>,
    pub duration_ms: Option<u64>,
    pub position_ms: Option<u64>,
    pub status: PlaybackStatus,
}

/// A host session considered during one selection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCandidate<S> {
    pub session: S,
    pub status: PlaybackStatus,
}

impl<S> SessionCandidate<S> {
    pub fn new(session: S, status: PlaybackStatus) -> Self {
        Self { session, status }
    }
}

/// Transport requests forwarded to the bound session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    /// Pause when the published snapshot is playing, play otherwise.
    TogglePlayback,
    Next,
    Previous,
}

impl TransportCommand {
    /// Resolve `TogglePlayback` against the currently published playing flag.
    pub fn resolve(self, is_playing: bool) -> Self {
        match self {
            Self::TogglePlayback if is_playing => Self::Pause,
            Self::TogglePlayback => Self::Play,
            other => other,
        }
    }

    /// MPRIS method name for the command.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::TogglePlayback => "PlayPause",
            Self::Next => "Next",
            Self::Previous => "Previous",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_idle_placeholder() {
        let snapshot = PlaybackSnapshot::default();
        assert_eq!(snapshot.title, "No Music");
        assert_eq!(snapshot.artist, "Select a song");
        assert!(!snapshot.is_playing);
        assert!(snapshot.album_art.is_none());
        assert_eq!(snapshot.duration_ms, 0);
        assert_eq!(snapshot.position_ms, 0);
        assert!(snapshot.is_idle_placeholder());
    }

    #[test]
    fn mpris_status_strings_map_to_variants() {
        assert_eq!(PlaybackStatus::from_mpris(Some("Playing")), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::from_mpris(Some("Paused")), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::from_mpris(Some("Stopped")), PlaybackStatus::Stopped);
        assert_eq!(PlaybackStatus::from_mpris(Some("")), PlaybackStatus::Idle);
        assert_eq!(PlaybackStatus::from_mpris(None), PlaybackStatus::Idle);
        assert_eq!(PlaybackStatus::from_mpris(Some("Rewinding")), PlaybackStatus::Unknown);
    }

    #[test]
    fn toggle_resolves_from_playing_flag() {
        assert_eq!(
            TransportCommand::TogglePlayback.resolve(true),
            TransportCommand::Pause
        );
        assert_eq!(
            TransportCommand::TogglePlayback.resolve(false),
            TransportCommand::Play
        );
        assert_eq!(TransportCommand::Next.resolve(true), TransportCommand::Next);
    }
}
