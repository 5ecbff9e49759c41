//! Converts host-reported session state into the canonical snapshot.

use crate::{PlaybackSnapshot, PlaybackStatus, RawSessionState, UNKNOWN_ARTIST, UNKNOWN_TITLE};

/// Apply field fallbacks and derive the playing flag.
///
/// Blank strings count as missing. Only `Playing` maps to `is_playing`;
/// buffering does not.
pub fn normalize(raw: RawSessionState) -> PlaybackSnapshot {
    PlaybackSnapshot {
        title: present(raw.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        artist: present(raw.artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        is_playing: raw.status == PlaybackStatus::Playing,
        album_art: raw.album_art.or(raw.art),
        duration_ms: raw.duration_ms.unwrap_or(0),
        position_ms: raw.position_ms.unwrap_or(0),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArtHandle, IDLE_TITLE};

    #[test]
    fn missing_metadata_uses_unknown_fallbacks() {
        let snapshot = normalize(RawSessionState::default());
        assert_eq!(snapshot.title, "Unknown Title");
        assert_eq!(snapshot.artist, "Unknown Artist");
        assert_ne!(snapshot.title, IDLE_TITLE);
        assert!(!snapshot.is_playing);
        assert_eq!(snapshot.album_art, None);
        assert_eq!(snapshot.duration_ms, 0);
        assert_eq!(snapshot.position_ms, 0);
    }

    #[test]
    fn blank_title_counts_as_missing() {
        let snapshot = normalize(RawSessionState {
            title: Some("  ".to_string()),
            artist: Some("Low".to_string()),
            ..RawSessionState::default()
        });
        assert_eq!(snapshot.title, "Unknown Title");
        assert_eq!(snapshot.artist, "Low");
    }

    #[test]
    fn only_playing_sets_is_playing() {
        for status in [
            PlaybackStatus::Idle,
            PlaybackStatus::Paused,
            PlaybackStatus::Buffering,
            PlaybackStatus::Stopped,
            PlaybackStatus::Unknown,
        ] {
            let snapshot = normalize(RawSessionState {
                status,
                ..RawSessionState::default()
            });
            assert!(!snapshot.is_playing, "{status} must not count as playing");
        }
        let playing = normalize(RawSessionState {
            status: PlaybackStatus::Playing,
            ..RawSessionState::default()
        });
        assert!(playing.is_playing);
    }

    #[test]
    fn album_art_prefers_primary_field() {
        let primary = ArtHandle::new("file:///covers/primary.png");
        let secondary = ArtHandle::new("file:///covers/secondary.png");
        let snapshot = normalize(RawSessionState {
            album_art: Some(primary.clone()),
            art: Some(secondary.clone()),
            ..RawSessionState::default()
        });
        assert_eq!(snapshot.album_art, Some(primary));

        let snapshot = normalize(RawSessionState {
            art: Some(secondary.clone()),
            ..RawSessionState::default()
        });
        assert_eq!(snapshot.album_art, Some(secondary));
    }

    #[test]
    fn reported_timing_is_kept_together() {
        let snapshot = normalize(RawSessionState {
            title: Some("Pale Blue".to_string()),
            duration_ms: Some(245_000),
            position_ms: Some(12_500),
            status: PlaybackStatus::Playing,
            ..RawSessionState::default()
        });
        assert_eq!(snapshot.duration_ms, 245_000);
        assert_eq!(snapshot.position_ms, 12_500);
    }
}
