//! Shutdown triggers for the daemon runtime.

use ambiplay_core::{DisplayState, DisplayView};
use tokio::signal;
use tokio::sync::watch;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum ShutdownReason {
    Interrupted,
    Terminated,
    DisplaySlept,
}

/// Wait for Ctrl-C, SIGTERM, or (when enabled) the display terminating.
pub(super) async fn shutdown_signal(
    mut display: watch::Receiver<DisplayView>,
    exit_on_sleep: bool,
) -> ShutdownReason {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            signal.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let slept = async move {
        if !exit_on_sleep
            || display
                .wait_for(|view| view.state == DisplayState::Terminated)
                .await
                .is_err()
        {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => ShutdownReason::Interrupted,
        _ = terminate => ShutdownReason::Terminated,
        _ = slept => ShutdownReason::DisplaySlept,
    }
}
