//! Two-layer connectivity supervision: transport (Wi-Fi) and session (MQTT).
//!
//! The supervisor owns both link states and the retry bookkeeping; the
//! network worker owns all I/O. Each poll of [`ConnectivitySupervisor::
//! next_command`] tells the worker what to do next, and every result or loss
//! fed back returns the state-machine events to dispatch. All calls come from
//! the worker's own execution context, never concurrently.

use heapless::Vec;
use log::{info, warn};

use crate::app::AppEvent;

/// Transport layer: bounded retries before going dormant.
pub const TRANSPORT_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 5,
    delay_ms: 5_000,
};

/// Session layer: fewer, faster retries while the transport holds.
pub const SESSION_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    delay_ms: 3_000,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u8,
    pub delay_ms: u32,
}

/// Per-layer link state. `dormant` marks a layer that exhausted its retries
/// and waits for an external trigger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkState {
    Down { dormant: bool },
    Connecting { attempt: u8 },
    Up,
}

impl LinkState {
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }

    const fn is_dormant(self) -> bool {
        matches!(self, Self::Down { dormant: true })
    }
}

/// What the network worker should do next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkCommand {
    ConnectTransport,
    ConnectSession,
    /// Nothing due yet; sleep at most this long (the worker may wake earlier
    /// to drain audio or handle hints).
    Wait { ms: u64 },
    /// Both layers settled (up or dormant); nothing scheduled.
    Idle,
}

/// Events to feed the application state machine, in dispatch order.
pub type EventBatch = Vec<AppEvent, 2>;

#[derive(Debug)]
struct Layer {
    state: LinkState,
    policy: RetryPolicy,
    next_attempt_ms: u64,
}

impl Layer {
    const fn new(policy: RetryPolicy, state: LinkState) -> Self {
        Self {
            state,
            policy,
            next_attempt_ms: 0,
        }
    }

    fn begin_connecting(&mut self, now_ms: u64) {
        self.state = LinkState::Connecting { attempt: 0 };
        self.next_attempt_ms = now_ms;
    }

    fn attempt_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_attempt_ms
    }

    /// Record a failed attempt; true when the retry budget is exhausted.
    fn record_failure(&mut self, now_ms: u64) -> bool {
        let LinkState::Connecting { attempt } = self.state else {
            return false;
        };
        let failures = attempt.saturating_add(1);
        if failures >= self.policy.max_attempts {
            self.state = LinkState::Down { dormant: true };
            true
        } else {
            self.state = LinkState::Connecting { attempt: failures };
            self.next_attempt_ms = now_ms + u64::from(self.policy.delay_ms);
            false
        }
    }
}

pub struct ConnectivitySupervisor {
    transport: Layer,
    session: Layer,
}

impl ConnectivitySupervisor {
    /// Boot state: transport immediately starts connecting, session waits
    /// for the transport to come up.
    pub fn new() -> Self {
        Self::with_policies(TRANSPORT_RETRY, SESSION_RETRY)
    }

    pub fn with_policies(transport: RetryPolicy, session: RetryPolicy) -> Self {
        Self {
            transport: Layer::new(transport, LinkState::Connecting { attempt: 0 }),
            session: Layer::new(session, LinkState::Down { dormant: false }),
        }
    }

    pub const fn transport_state(&self) -> LinkState {
        self.transport.state
    }

    pub const fn session_state(&self) -> LinkState {
        self.session.state
    }

    pub fn next_command(&self, now_ms: u64) -> LinkCommand {
        match self.transport.state {
            LinkState::Connecting { .. } => {
                if self.transport.attempt_due(now_ms) {
                    LinkCommand::ConnectTransport
                } else {
                    LinkCommand::Wait {
                        ms: self.transport.next_attempt_ms - now_ms,
                    }
                }
            }
            LinkState::Up => match self.session.state {
                LinkState::Connecting { .. } => {
                    if self.session.attempt_due(now_ms) {
                        LinkCommand::ConnectSession
                    } else {
                        LinkCommand::Wait {
                            ms: self.session.next_attempt_ms - now_ms,
                        }
                    }
                }
                _ => LinkCommand::Idle,
            },
            LinkState::Down { .. } => LinkCommand::Idle,
        }
    }

    /// Outcome of a `ConnectTransport` attempt.
    pub fn on_transport_result(&mut self, ok: bool, now_ms: u64) -> EventBatch {
        let mut events = EventBatch::new();
        if !matches!(self.transport.state, LinkState::Connecting { .. }) {
            return events;
        }

        if ok {
            self.transport.state = LinkState::Up;
            info!("transport up");
            let _ = events.push(AppEvent::LinkUp);
            // Session attempts begin as soon as the transport holds.
            self.session.begin_connecting(now_ms);
        } else if self.transport.record_failure(now_ms) {
            warn!(
                "transport connect failed {} times; dormant until external trigger",
                self.transport.policy.max_attempts
            );
            let _ = events.push(AppEvent::LinkDown);
        } else {
            info!(
                "transport connect failed; retrying in {} ms",
                self.transport.policy.delay_ms
            );
        }
        events
    }

    /// Outcome of a `ConnectSession` attempt.
    pub fn on_session_result(&mut self, ok: bool, now_ms: u64) -> EventBatch {
        let mut events = EventBatch::new();
        if !self.transport.state.is_up()
            || !matches!(self.session.state, LinkState::Connecting { .. })
        {
            return events;
        }

        if ok {
            self.session.state = LinkState::Up;
            info!("session up");
            let _ = events.push(AppEvent::SessionUp);
        } else if self.session.record_failure(now_ms) {
            warn!(
                "session connect failed {} times; dormant until external trigger",
                self.session.policy.max_attempts
            );
            let _ = events.push(AppEvent::SessionDown);
        } else {
            info!(
                "session connect failed; retrying in {} ms",
                self.session.policy.delay_ms
            );
        }
        events
    }

    /// Transport loss, detected by the worker or hinted by the state machine.
    /// Forces the session down without a separate negotiation: transport
    /// recovery always takes precedence over an in-flight session reconnect.
    /// Idempotent: losses reported while not `Up` are ignored.
    pub fn on_transport_lost(&mut self, now_ms: u64) -> EventBatch {
        let mut events = EventBatch::new();
        if !self.transport.state.is_up() {
            return events;
        }

        if self.session.state.is_up() {
            let _ = events.push(AppEvent::SessionDown);
        }
        self.session.state = LinkState::Down { dormant: false };
        warn!("transport lost; reconnecting");
        let _ = events.push(AppEvent::LinkDown);
        self.transport.begin_connecting(now_ms);
        events
    }

    /// Unsolicited session loss (broker disconnect, failed publish) while the
    /// transport still holds. Idempotent like [`Self::on_transport_lost`].
    pub fn on_session_lost(&mut self, now_ms: u64) -> EventBatch {
        let mut events = EventBatch::new();
        if !self.session.state.is_up() {
            return events;
        }

        warn!("session lost; reconnecting");
        let _ = events.push(AppEvent::SessionDown);
        if self.transport.state.is_up() {
            self.session.begin_connecting(now_ms);
        } else {
            self.session.state = LinkState::Down { dormant: false };
        }
        events
    }

    /// External stimulus (periodic health check, "link became available"):
    /// restarts whichever dormant layer applies. No-op otherwise.
    pub fn external_trigger(&mut self, now_ms: u64) {
        if self.transport.state.is_dormant() {
            info!("external trigger; restarting transport attempts");
            self.transport.begin_connecting(now_ms);
        } else if self.transport.state.is_up() && self.session.state.is_dormant() {
            info!("external trigger; restarting session attempts");
            self.session.begin_connecting(now_ms);
        }
    }
}

impl Default for ConnectivitySupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
