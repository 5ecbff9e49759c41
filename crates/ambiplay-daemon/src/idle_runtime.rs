//! Periodic idle/dim/sleep evaluation for the display.

use std::sync::Arc;
use std::time::Duration;

use ambiplay_core::{
    DisplayState, DisplayView, IdleConfig, IdleMachine, IdlePolicy, InteractionClock,
    PlaybackSnapshot, Transition,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Producer side for UI interaction events.
#[derive(Clone)]
pub struct IdleHandle {
    clock: Arc<InteractionClock>,
    interaction_tx: mpsc::UnboundedSender<u64>,
}

impl IdleHandle {
    /// Stamp the interaction clock and wake the display.
    pub fn interact(&self) {
        let at_ms = self.clock.touch();
        let _ = self.interaction_tx.send(at_ms);
    }
}

/// Tick loop task; aborted when the runtime is dropped.
pub struct IdleRuntime {
    task: JoinHandle<()>,
    handle: IdleHandle,
    display_rx: watch::Receiver<DisplayView>,
}

impl IdleRuntime {
    pub fn start(
        config: &IdleConfig,
        clock: Arc<InteractionClock>,
        snapshot_rx: watch::Receiver<PlaybackSnapshot>,
    ) -> Self {
        let (display_tx, display_rx) = watch::channel(DisplayView::active());
        let (interaction_tx, interaction_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_idle_loop(
            IdleMachine::new(IdlePolicy::from(config)),
            Duration::from_millis(config.tick_interval_ms),
            config.dim_opacity,
            clock.clone(),
            snapshot_rx,
            interaction_rx,
            display_tx,
        ));

        Self {
            task,
            handle: IdleHandle {
                clock,
                interaction_tx,
            },
            display_rx,
        }
    }

    pub fn handle(&self) -> IdleHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayView> {
        self.display_rx.clone()
    }
}

impl Drop for IdleRuntime {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_idle_loop(
    mut machine: IdleMachine,
    tick: Duration,
    dim_opacity: f64,
    clock: Arc<InteractionClock>,
    snapshot_rx: watch::Receiver<PlaybackSnapshot>,
    mut interaction_rx: mpsc::UnboundedReceiver<u64>,
    display_tx: watch::Sender<DisplayView>,
) {
    let mut ticker = tokio::time::interval(tick);
    // A stalled loop resumes on a fresh cadence instead of bursting ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let transition = tokio::select! {
            _ = ticker.tick() => {
                let is_playing = snapshot_rx.borrow().is_playing;
                machine.tick(clock.now_ms(), clock.last(), is_playing)
            }
            at_ms = interaction_rx.recv() => {
                let Some(at_ms) = at_ms else {
                    break;
                };
                machine.interact(at_ms)
            }
        };
        if let Some(transition) = transition {
            announce(&display_tx, &transition, dim_opacity);
        }
        if machine.is_terminated() {
            break;
        }
    }
    debug!("idle loop stopped");
}

fn announce(display_tx: &watch::Sender<DisplayView>, transition: &Transition, dim_opacity: f64) {
    match transition.to {
        DisplayState::Terminated => {
            info!(at_ms = transition.at_ms, "display idle with playback stopped; requesting termination");
        }
        DisplayState::Dimmed => debug!(at_ms = transition.at_ms, "display dimmed"),
        DisplayState::Active => debug!(at_ms = transition.at_ms, "display reactivated"),
    }
    display_tx.send_replace(DisplayView::from_transition(transition, dim_opacity));
}
