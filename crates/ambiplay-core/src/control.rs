//! D-Bus control interface types and proxy definitions.

use serde::{Deserialize, Serialize};
use zbus::proxy;
use zbus::zvariant::Type;

use crate::{DisplayState, PlaybackSnapshot, Transition};

/// Well-known bus name for the ambiplay control interface.
pub const CONTROL_BUS_NAME: &str = "io.ambiplay.Control";
/// Object path for control methods and signals.
pub const CONTROL_OBJECT_PATH: &str = "/io/ambiplay/Control";

/// Wire form of a playback snapshot. Absent artwork is an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct SnapshotView {
    pub title: String,
    pub artist: String,
    pub is_playing: bool,
    pub art_uri: String,
    pub duration_ms: u64,
    pub position_ms: u64,
}

impl PlaybackSnapshot {
    /// Convert to the wire view for UI consumption.
    pub fn to_view(&self) -> SnapshotView {
        SnapshotView {
            title: self.title.clone(),
            artist: self.artist.clone(),
            is_playing: self.is_playing,
            art_uri: self
                .album_art
                .as_ref()
                .map(|art| art.as_str().to_string())
                .unwrap_or_default(),
            duration_ms: self.duration_ms,
            position_ms: self.position_ms,
        }
    }
}

/// Display activity exposed to the renderer.
///
/// `overlay_opacity` is the target the dim overlay eases toward; easing is
/// the renderer's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct DisplayView {
    pub state: DisplayState,
    pub dimmed: bool,
    pub overlay_opacity: f64,
    /// Milliseconds since daemon start at which `state` was entered.
    pub since_ms: u64,
}

impl DisplayView {
    pub fn active() -> Self {
        Self {
            state: DisplayState::Active,
            dimmed: false,
            overlay_opacity: 0.0,
            since_ms: 0,
        }
    }

    pub fn from_transition(transition: &Transition, dim_opacity: f64) -> Self {
        let dimmed = transition.to.is_dimmed();
        Self {
            state: transition.to,
            dimmed,
            overlay_opacity: if dimmed { dim_opacity } else { 0.0 },
            since_ms: transition.at_ms,
        }
    }
}

#[proxy(
    interface = "io.ambiplay.Control",
    default_service = "io.ambiplay.Control",
    default_path = "/io/ambiplay/Control"
)]
trait Control {
    /// Latest published playback snapshot.
    fn get_snapshot(&self) -> zbus::Result<SnapshotView>;

    /// Current display activity state.
    fn get_display(&self) -> zbus::Result<DisplayView>;

    /// Whether session access is currently granted.
    fn has_authorization(&self) -> zbus::Result<bool>;

    /// Grant or revoke session access.
    fn set_access(&self, granted: bool) -> zbus::Result<()>;

    /// Report a user interaction.
    fn interact(&self) -> zbus::Result<()>;

    fn play(&self) -> zbus::Result<()>;

    fn pause(&self) -> zbus::Result<()>;

    fn toggle_playback(&self) -> zbus::Result<()>;

    fn next(&self) -> zbus::Result<()>;

    fn previous(&self) -> zbus::Result<()>;

    /// Re-query the session directory.
    fn refresh(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn snapshot_changed(&self, snapshot: SnapshotView) -> zbus::Result<()>;

    #[zbus(signal)]
    fn display_changed(&self, display: DisplayView) -> zbus::Result<()>;

    #[zbus(signal)]
    fn termination_requested(&self) -> zbus::Result<()>;
}
