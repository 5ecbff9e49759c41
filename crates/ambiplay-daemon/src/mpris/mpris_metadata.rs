//! Metadata extraction helpers for MPRIS players.
//!
//! Decodes raw MPRIS properties into host-reported session state; fallbacks
//! are left to the normalizer.

use std::collections::HashMap;
use std::path::Path;

use ambiplay_core::{ArtHandle, PlaybackStatus, RawSessionState, SessionError};
use url::Url;
use zbus::zvariant::OwnedValue;
use zbus::Connection;

use super::mpris_bus::player_proxy;

pub(super) async fn read_session_state(
    connection: &Connection,
    bus_name: &str,
) -> Result<RawSessionState, SessionError> {
    let player = player_proxy(connection, bus_name).await?;
    // Players that omit a property still get a snapshot built from the rest.
    let metadata: HashMap<String, OwnedValue> =
        player.get_property("Metadata").await.unwrap_or_default();
    let status = player
        .get_property::<String>("PlaybackStatus")
        .await
        .ok();
    let position_us = player.get_property::<i64>("Position").await.ok();

    Ok(RawSessionState {
        title: metadata_string(&metadata, "xesam:title"),
        artist: metadata_artist(&metadata),
        album_art: metadata_string(&metadata, "mpris:artUrl").and_then(art_handle),
        art: None,
        duration_ms: metadata_length_us(&metadata).and_then(micros_to_ms),
        position_ms: position_us.and_then(micros_to_ms),
        status: PlaybackStatus::from_mpris(status.as_deref()),
    })
}

fn metadata_string(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    let owned = value.try_clone().ok()?;
    String::try_from(owned).ok()
}

fn metadata_artist(map: &HashMap<String, OwnedValue>) -> Option<String> {
    let value = map.get("xesam:artist")?;
    let artists_value = value.try_clone().ok()?;
    if let Ok(artists) = Vec::<String>::try_from(artists_value) {
        let joined = artists
            .into_iter()
            .map(|artist| artist.trim().to_string())
            .filter(|artist| !artist.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        return (!joined.is_empty()).then_some(joined);
    }
    let owned = value.try_clone().ok()?;
    String::try_from(owned).ok()
}

/// `mpris:length` is specified as int64 but some players send uint64.
fn metadata_length_us(map: &HashMap<String, OwnedValue>) -> Option<i64> {
    let value = map.get("mpris:length")?;
    if let Ok(length) = i64::try_from(value) {
        return Some(length);
    }
    u64::try_from(value)
        .ok()
        .and_then(|length| i64::try_from(length).ok())
}

fn micros_to_ms(value: i64) -> Option<u64> {
    u64::try_from(value).ok().map(|micros| micros / 1_000)
}

fn art_handle(value: String) -> Option<ArtHandle> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with('/') {
        return Path::new(value)
            .is_file()
            .then(|| ArtHandle::new(format!("file://{value}")));
    }
    let url = Url::parse(value).ok()?;
    match url.scheme() {
        "file" | "http" | "https" | "data" => Some(ArtHandle::new(value)),
        _ => None,
    }
}
