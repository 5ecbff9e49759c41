//! D-Bus discovery, subscription, and command handling for MPRIS players.

use std::collections::HashMap;

use ambiplay_core::{
    PlaybackStatus, SessionCandidate, SessionError, SessionTrigger, SessionsConfig,
    TransportCommand,
};
use futures_util::StreamExt;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::debug;
use zbus::fdo::{DBusProxy, PropertiesProxy};
use zbus::proxy::CacheProperties;
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, MatchRule, Message, MessageStream, Proxy, ProxyBuilder};

use super::{
    MprisSession, PropertiesListener, SessionSignal, MPRIS_PATH, MPRIS_PLAYER, MPRIS_PREFIX,
};

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

pub fn is_mpris_name(name: &str) -> bool {
    name.starts_with(MPRIS_PREFIX)
}

/// Allowed MPRIS players in `ListNames` order, each with its current status.
pub(super) async fn list_candidates(
    connection: &Connection,
    dbus_proxy: &DBusProxy<'_>,
    config: &SessionsConfig,
) -> Result<Vec<SessionCandidate<MprisSession>>, SessionError> {
    let names = dbus_proxy.list_names().await.map_err(zbus::Error::from)?;
    let mut candidates = Vec::new();
    for name in names {
        let name = name.to_string();
        if !is_mpris_name(&name) || !is_allowed_player(&name, config) {
            continue;
        }
        let status = fetch_playback_status(connection, &name).await;
        candidates.push(SessionCandidate::new(MprisSession::new(name), status));
    }
    Ok(candidates)
}

async fn fetch_playback_status(connection: &Connection, name: &str) -> PlaybackStatus {
    let status = match player_proxy(connection, name).await {
        Ok(player) => player.get_property::<String>("PlaybackStatus").await,
        Err(err) => Err(err),
    };
    match status {
        Ok(status) => PlaybackStatus::from_mpris(Some(&status)),
        Err(err) => {
            debug!(?err, player = %name, "playback status unavailable");
            PlaybackStatus::Unknown
        }
    }
}

pub(super) async fn player_proxy(
    connection: &Connection,
    name: &str,
) -> zbus::Result<Proxy<'static>> {
    ProxyBuilder::new(connection)
        .destination(name.to_string())?
        .path(MPRIS_PATH)?
        .interface(MPRIS_PLAYER)?
        .cache_properties(CacheProperties::No)
        .build()
        .await
}

/// Register a listener on one player.
///
/// Returns once both signal streams are subscribed so no change between
/// binding and the first read is missed.
pub(super) async fn subscribe_player(
    connection: &Connection,
    session: &MprisSession,
    signal_tx: UnboundedSender<SessionSignal>,
) -> Result<PropertiesListener, SessionError> {
    let bus_name = session.bus_name().to_string();
    let properties = PropertiesProxy::builder(connection)
        .destination(bus_name.clone())?
        .path(MPRIS_PATH)?
        .build()
        .await?;
    let player = player_proxy(connection, &bus_name).await?;
    let (ready_tx, ready_rx) = oneshot::channel::<zbus::Result<()>>();

    let listener_name = bus_name.clone();
    let task = tokio::spawn(async move {
        let streams = async {
            let changes = properties.receive_properties_changed().await?;
            let seeks = player.receive_signal("Seeked").await?;
            zbus::Result::Ok((changes, seeks))
        }
        .await;
        let (mut changes, mut seeks) = match streams {
            Ok(streams) => {
                let _ = ready_tx.send(Ok(()));
                streams
            }
            Err(err) => {
                let _ = ready_tx.send(Err(err));
                return;
            }
        };

        loop {
            let trigger = tokio::select! {
                update = changes.next() => {
                    let Some(update) = update else {
                        break;
                    };
                    match update.args() {
                        Ok(args) if args.interface_name == MPRIS_PLAYER => classify_change(
                            &args.changed_properties,
                            &args.invalidated_properties,
                        ),
                        _ => None,
                    }
                }
                seek = seeks.next() => {
                    if seek.is_none() {
                        break;
                    }
                    Some(SessionTrigger::Playback)
                }
            };
            let Some(trigger) = trigger else {
                continue;
            };
            debug!(player = %listener_name, ?trigger, "media properties changed");
            let signal = SessionSignal {
                bus_name: listener_name.clone(),
                trigger,
            };
            if signal_tx.send(signal).is_err() {
                break;
            }
        }
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(PropertiesListener { task }),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(SessionError::Unavailable(format!(
            "listener for {bus_name} stopped before subscribing"
        ))),
    }
}

/// Metadata wins when both halves change; either one re-reads everything.
fn classify_change(
    changed: &HashMap<&str, Value<'_>>,
    invalidated: &[&str],
) -> Option<SessionTrigger> {
    const PLAYBACK_KEYS: [&str; 2] = ["PlaybackStatus", "Rate"];

    let touched = |key: &str| changed.contains_key(key) || invalidated.contains(&key);
    if touched("Metadata") {
        return Some(SessionTrigger::Metadata);
    }
    if PLAYBACK_KEYS.iter().any(|key| touched(key)) {
        return Some(SessionTrigger::Playback);
    }
    None
}

pub(super) async fn call_transport(
    connection: &Connection,
    bus_name: &str,
    command: TransportCommand,
) -> Result<(), SessionError> {
    let player = player_proxy(connection, bus_name).await?;
    debug!(player = %bus_name, method = command.method_name(), "media command");
    let _value: () = player.call(command.method_name(), &()).await?;
    Ok(())
}

/// Stream of `PropertiesChanged` signals from every MPRIS player.
///
/// A playback status change anywhere can change which session should be
/// shown, so these count as session update events.
pub async fn playback_status_changes(connection: &Connection) -> zbus::Result<MessageStream> {
    let rule = MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface(PROPERTIES_INTERFACE)?
        .member("PropertiesChanged")?
        .path(MPRIS_PATH)?
        .arg(0, MPRIS_PLAYER)?
        .build();
    MessageStream::for_match_rule(rule, connection, None).await
}

pub fn is_playback_status_change(message: &Message) -> bool {
    let body = message.body();
    let Ok((interface, changed, invalidated)) =
        body.deserialize::<(String, HashMap<String, OwnedValue>, Vec<String>)>()
    else {
        return false;
    };
    interface == MPRIS_PLAYER
        && (changed.contains_key("PlaybackStatus")
            || invalidated.iter().any(|key| key == "PlaybackStatus"))
}

pub(super) fn is_allowed_player(name: &str, config: &SessionsConfig) -> bool {
    let lower = name.to_lowercase();
    if config.denylist.iter().any(|entry| lower.contains(entry.as_str())) {
        return false;
    }

    if !config.allowlist.is_empty() {
        return config
            .allowlist
            .iter()
            .any(|entry| lower.contains(entry.as_str()));
    }

    if !config.include_browsers {
        let browser_tokens = ["firefox", "brave", "chromium", "chrome", "vivaldi"];
        if browser_tokens.iter().any(|token| lower.contains(token)) {
            return false;
        }
    }

    true
}
