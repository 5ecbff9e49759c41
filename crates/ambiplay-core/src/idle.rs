//! Idle, dim, and sleep policy for the ambient display.
//!
//! Time is expressed as milliseconds since the interaction clock's origin so
//! the machine can be driven with explicit timestamps in tests. Policy is
//! elapsed-time based and tolerates tick jitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

use crate::IdleConfig;

/// Display activity state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[repr(u32)]
pub enum DisplayState {
    #[default]
    Active = 0,
    Dimmed = 1,
    /// Terminal; the display surface should close.
    Terminated = 2,
}

impl DisplayState {
    pub fn is_dimmed(self) -> bool {
        self == Self::Dimmed
    }
}

/// A state change and the instant it was decided.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: DisplayState,
    pub to: DisplayState,
    pub at_ms: u64,
}

/// Idle thresholds, both measured from the last interaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdlePolicy {
    pub dim_after_ms: u64,
    pub terminate_after_ms: u64,
}

impl Default for IdlePolicy {
    fn default() -> Self {
        Self {
            dim_after_ms: 7_000,
            terminate_after_ms: 10_000,
        }
    }
}

impl From<&IdleConfig> for IdlePolicy {
    fn from(config: &IdleConfig) -> Self {
        Self {
            dim_after_ms: config.dim_after_ms,
            terminate_after_ms: config.terminate_after_ms,
        }
    }
}

/// Last interaction timestamp shared between the interaction producer and
/// the tick loop.
#[derive(Debug)]
pub struct InteractionClock {
    origin: Instant,
    last_ms: AtomicU64,
}

impl InteractionClock {
    /// Creating the clock counts as an interaction at time zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    pub fn now_ms(&self) -> u64 {
        duration_ms(self.origin.elapsed())
    }

    /// Record an interaction now and return its timestamp.
    pub fn touch(&self) -> u64 {
        let now = self.now_ms();
        self.record(now);
        now
    }

    pub fn record(&self, at_ms: u64) {
        self.last_ms.store(at_ms, Ordering::Release);
    }

    pub fn last(&self) -> u64 {
        self.last_ms.load(Ordering::Acquire)
    }
}

impl Default for InteractionClock {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Pure idle state machine, evaluated once per tick.
#[derive(Debug, Clone)]
pub struct IdleMachine {
    policy: IdlePolicy,
    state: DisplayState,
}

impl IdleMachine {
    pub fn new(policy: IdlePolicy) -> Self {
        Self {
            policy,
            state: DisplayState::Active,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn is_dimmed(&self) -> bool {
        self.state.is_dimmed()
    }

    pub fn is_terminated(&self) -> bool {
        self.state == DisplayState::Terminated
    }

    /// Evaluate the policy at `now_ms`.
    ///
    /// Termination needs playback stopped and supersedes dimming; dimming
    /// only happens from `Active`.
    pub fn tick(
        &mut self,
        now_ms: u64,
        last_interaction_ms: u64,
        is_playing: bool,
    ) -> Option<Transition> {
        if self.is_terminated() {
            return None;
        }
        let idle_for = now_ms.saturating_sub(last_interaction_ms);
        if !is_playing && idle_for > self.policy.terminate_after_ms {
            return Some(self.transition(DisplayState::Terminated, now_ms));
        }
        if self.state == DisplayState::Active && idle_for > self.policy.dim_after_ms {
            return Some(self.transition(DisplayState::Dimmed, now_ms));
        }
        None
    }

    /// Any interaction reactivates the display unless it already terminated.
    pub fn interact(&mut self, now_ms: u64) -> Option<Transition> {
        match self.state {
            DisplayState::Dimmed => Some(self.transition(DisplayState::Active, now_ms)),
            DisplayState::Active | DisplayState::Terminated => None,
        }
    }

    fn transition(&mut self, to: DisplayState, at_ms: u64) -> Transition {
        let from = self.state;
        self.state = to;
        Transition { from, to, at_ms }
    }
}
