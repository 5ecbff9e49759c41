//! Log hygiene helpers shared by the daemon and the synchronizer.

use std::env;

const DEFAULT_LOG_LIMIT: usize = 160;
const DIAGNOSTIC_LOG_LIMIT: usize = 512;

/// Returns true when diagnostics are explicitly enabled via environment.
pub fn diagnostic_mode() -> bool {
    diagnostic_mode_from(env::var("AMBIPLAY_DIAGNOSTIC").ok().as_deref())
}

fn diagnostic_mode_from(value: Option<&str>) -> bool {
    matches!(
        value
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Returns the effective log snippet limit for the current mode.
pub fn log_limit() -> usize {
    log_limit_for(diagnostic_mode())
}

fn log_limit_for(diagnostic: bool) -> usize {
    if diagnostic {
        DIAGNOSTIC_LOG_LIMIT
    } else {
        DEFAULT_LOG_LIMIT
    }
}

/// Strip newlines and cap length so track metadata stays on one log line.
pub fn sanitize_log_value(value: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let mut cleaned = String::with_capacity(max_len.min(value.len()));
    let mut truncated = false;
    for (count, ch) in value.chars().enumerate() {
        if count >= max_len {
            truncated = true;
            break;
        }
        cleaned.push(if ch == '\n' || ch == '\r' { ' ' } else { ch });
    }
    let trimmed = cleaned.trim();
    if truncated {
        format!("{trimmed}...")
    } else {
        trimmed.to_string()
    }
}

/// Produces a safe log snippet honoring diagnostic mode limits.
pub fn log_snippet(value: &str) -> String {
    sanitize_log_value(value, log_limit())
}
