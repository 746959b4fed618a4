//! Application state machine: the single source of truth for device behavior.
//!
//! Events arrive from the connectivity supervisor and the touch debouncer;
//! entry actions fan out to the indicator, the capture gate, and the network
//! worker through the [`StateActions`] seam. Callers must serialize access;
//! the transition logic itself never blocks.

use log::{debug, info};

use crate::indicator::IndicatorPattern;

/// Operating states of the device. Exactly one is active at any instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperatingState {
    /// No transport link; everything but reconnection is parked.
    LinkDown,
    /// Transport up, broker session not established.
    SessionDown,
    /// Connected and waiting for the user to start a meeting.
    Idle,
    /// Audio frames are being produced and streamed.
    Capturing,
    /// Meeting paused; production halted, queued frames may still drain.
    CapturePaused,
}

/// Events consumed by the state machine. Tags only, no payloads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppEvent {
    LinkUp,
    LinkDown,
    SessionUp,
    SessionDown,
    PrimaryPressed,
    SecondaryLongPressed,
}

/// Side effects run when a state is entered. Implemented once per target
/// platform; tests use a recording fake.
pub trait StateActions {
    fn set_indicator(&mut self, pattern: IndicatorPattern);
    fn start_capture(&mut self);
    fn stop_capture(&mut self);
    /// Idempotent hint to the network worker; the supervisor drives its own
    /// retries independently.
    fn link_considered_lost(&mut self);
    fn session_considered_lost(&mut self);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transition {
    pub previous: OperatingState,
    pub current: OperatingState,
}

pub struct AppStateMachine<A: StateActions> {
    state: OperatingState,
    actions: A,
}

impl<A: StateActions> AppStateMachine<A> {
    /// Starts in [`OperatingState::LinkDown`] and runs its entry action once.
    pub fn new(actions: A) -> Self {
        let mut machine = Self {
            state: OperatingState::LinkDown,
            actions,
        };
        info!("state machine initialized in {:?}", machine.state);
        machine.run_entry_action();
        machine
    }

    pub const fn state(&self) -> OperatingState {
        self.state
    }

    /// Apply one event. The destination's entry action runs exactly once and
    /// only when the state actually changes; pairs outside the transition
    /// table are deliberate no-ops.
    pub fn handle_event(&mut self, event: AppEvent) -> Transition {
        let previous = self.state;
        match next_state(previous, event) {
            Some(next) => {
                self.state = next;
                info!("state {:?} -> {:?} on {:?}", previous, next, event);
                self.run_entry_action();
            }
            None => {
                debug!("event {:?} ignored in {:?}", event, previous);
            }
        }
        Transition {
            previous,
            current: self.state,
        }
    }

    fn run_entry_action(&mut self) {
        self.actions
            .set_indicator(IndicatorPattern::for_state(self.state));
        match self.state {
            OperatingState::LinkDown => {
                self.actions.stop_capture();
                self.actions.link_considered_lost();
            }
            OperatingState::SessionDown => {
                self.actions.stop_capture();
                self.actions.session_considered_lost();
            }
            OperatingState::Idle | OperatingState::CapturePaused => {
                self.actions.stop_capture();
            }
            OperatingState::Capturing => {
                self.actions.start_capture();
            }
        }
    }
}

/// The transition table. `None` means the pair is a harmless no-op: the
/// connectivity supervisor is the sole source of link/session events and
/// guarantees their ordering, so e.g. `SessionUp` while `Idle` is
/// unreachable-but-safe rather than an error.
const fn next_state(current: OperatingState, event: AppEvent) -> Option<OperatingState> {
    use AppEvent as E;
    use OperatingState as S;

    match (current, event) {
        (S::LinkDown, E::LinkUp) => Some(S::SessionDown),
        (S::SessionDown, E::LinkDown) => Some(S::LinkDown),
        (S::SessionDown, E::SessionUp) => Some(S::Idle),
        (S::Idle, E::LinkDown) => Some(S::LinkDown),
        (S::Idle, E::SessionDown) => Some(S::SessionDown),
        (S::Idle, E::PrimaryPressed) => Some(S::Capturing),
        (S::Capturing, E::LinkDown) => Some(S::LinkDown),
        (S::Capturing, E::SessionDown) => Some(S::SessionDown),
        (S::Capturing, E::PrimaryPressed) => Some(S::CapturePaused),
        (S::CapturePaused, E::LinkDown) => Some(S::LinkDown),
        (S::CapturePaused, E::SessionDown) => Some(S::SessionDown),
        (S::CapturePaused, E::PrimaryPressed) => Some(S::Capturing),
        (S::CapturePaused, E::SecondaryLongPressed) => Some(S::Idle),
        _ => None,
    }
}
