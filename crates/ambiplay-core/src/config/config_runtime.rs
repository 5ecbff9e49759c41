//! Runtime adjustments applied after configuration is parsed.

use super::{IdleConfig, SessionsConfig};

pub(super) fn apply_idle_defaults(idle: &mut IdleConfig) {
    if idle.tick_interval_ms == 0 {
        idle.tick_interval_ms = IdleConfig::DEFAULT_TICK_INTERVAL_MS;
    }
    idle.dim_opacity = if idle.dim_opacity.is_finite() {
        idle.dim_opacity.clamp(0.0, 1.0)
    } else {
        IdleConfig::default().dim_opacity
    };
}

pub(super) fn normalize_player_filters(sessions: &mut SessionsConfig) {
    // Lowercase once so per-player matching stays allocation-light.
    for entry in sessions
        .allowlist
        .iter_mut()
        .chain(sessions.denylist.iter_mut())
    {
        *entry = entry.trim().to_lowercase();
    }
    sessions.allowlist.retain(|entry| !entry.is_empty());
    sessions.denylist.retain(|entry| !entry.is_empty());
}
