use super::*;

fn events(batch: &EventBatch) -> &[AppEvent] {
    batch.as_slice()
}

/// Bring a fresh supervisor to transport-up (session connecting).
fn transport_up(now_ms: u64) -> ConnectivitySupervisor {
    let mut sup = ConnectivitySupervisor::new();
    assert_eq!(sup.next_command(now_ms), LinkCommand::ConnectTransport);
    let batch = sup.on_transport_result(true, now_ms);
    assert_eq!(events(&batch), [AppEvent::LinkUp]);
    sup
}

/// Bring a fresh supervisor all the way to session-up.
fn session_up(now_ms: u64) -> ConnectivitySupervisor {
    let mut sup = transport_up(now_ms);
    assert_eq!(sup.next_command(now_ms), LinkCommand::ConnectSession);
    let batch = sup.on_session_result(true, now_ms);
    assert_eq!(events(&batch), [AppEvent::SessionUp]);
    sup
}

#[test]
fn boot_connects_transport_immediately() {
    let sup = ConnectivitySupervisor::new();
    assert_eq!(sup.transport_state(), LinkState::Connecting { attempt: 0 });
    assert_eq!(sup.session_state(), LinkState::Down { dormant: false });
    assert_eq!(sup.next_command(0), LinkCommand::ConnectTransport);
}

#[test]
fn transport_success_starts_session_attempts() {
    let sup = transport_up(100);
    assert_eq!(sup.transport_state(), LinkState::Up);
    assert_eq!(sup.session_state(), LinkState::Connecting { attempt: 0 });
    assert_eq!(sup.next_command(100), LinkCommand::ConnectSession);
}

#[test]
fn transport_failures_wait_then_go_dormant_after_five() {
    let mut sup = ConnectivitySupervisor::new();
    let mut now = 0u64;

    for attempt in 0..4 {
        assert_eq!(sup.next_command(now), LinkCommand::ConnectTransport);
        let batch = sup.on_transport_result(false, now);
        assert!(events(&batch).is_empty(), "attempt {attempt} must not report");
        assert_eq!(
            sup.next_command(now),
            LinkCommand::Wait {
                ms: u64::from(TRANSPORT_RETRY.delay_ms)
            }
        );
        now += u64::from(TRANSPORT_RETRY.delay_ms);
    }

    // Fifth failure exhausts the budget: one LinkDown, then dormancy.
    assert_eq!(sup.next_command(now), LinkCommand::ConnectTransport);
    let batch = sup.on_transport_result(false, now);
    assert_eq!(events(&batch), [AppEvent::LinkDown]);
    assert_eq!(sup.transport_state(), LinkState::Down { dormant: true });

    // No further automatic attempt, even far in the future.
    assert_eq!(sup.next_command(now + 1_000_000), LinkCommand::Idle);
}

#[test]
fn external_trigger_restarts_a_dormant_transport() {
    let mut sup = ConnectivitySupervisor::new();
    let mut now = 0u64;
    for _ in 0..5 {
        sup.on_transport_result(false, now);
        now += u64::from(TRANSPORT_RETRY.delay_ms);
    }
    assert_eq!(sup.next_command(now), LinkCommand::Idle);

    sup.external_trigger(now);
    assert_eq!(sup.next_command(now), LinkCommand::ConnectTransport);
}

#[test]
fn session_failures_go_dormant_after_three_with_one_report() {
    let mut sup = transport_up(0);
    let mut now = 0u64;

    for _ in 0..2 {
        assert_eq!(sup.next_command(now), LinkCommand::ConnectSession);
        let batch = sup.on_session_result(false, now);
        assert!(events(&batch).is_empty());
        now += u64::from(SESSION_RETRY.delay_ms);
    }

    let batch = sup.on_session_result(false, now);
    assert_eq!(events(&batch), [AppEvent::SessionDown]);
    assert_eq!(sup.session_state(), LinkState::Down { dormant: true });
    assert_eq!(sup.transport_state(), LinkState::Up);
    assert_eq!(sup.next_command(now), LinkCommand::Idle);

    // A trigger with the transport still up restarts only the session.
    sup.external_trigger(now);
    assert_eq!(sup.next_command(now), LinkCommand::ConnectSession);
}

#[test]
fn session_retry_delay_is_respected() {
    let mut sup = transport_up(1_000);
    let batch = sup.on_session_result(false, 1_000);
    assert!(events(&batch).is_empty());
    assert_eq!(sup.next_command(1_000), LinkCommand::Wait { ms: 3_000 });
    assert_eq!(sup.next_command(2_500), LinkCommand::Wait { ms: 1_500 });
    assert_eq!(sup.next_command(4_000), LinkCommand::ConnectSession);
}

#[test]
fn transport_loss_forces_session_down_and_reports_both() {
    let mut sup = session_up(0);

    let batch = sup.on_transport_lost(10_000);
    assert_eq!(events(&batch), [AppEvent::SessionDown, AppEvent::LinkDown]);
    assert_eq!(sup.session_state(), LinkState::Down { dormant: false });
    assert_eq!(sup.transport_state(), LinkState::Connecting { attempt: 0 });
    assert_eq!(sup.next_command(10_000), LinkCommand::ConnectTransport);
}

#[test]
fn transport_loss_supersedes_an_inflight_session_reconnect() {
    let mut sup = transport_up(0);
    // Session is mid-reconnect, not up.
    assert_eq!(sup.session_state(), LinkState::Connecting { attempt: 0 });

    let batch = sup.on_transport_lost(500);
    assert_eq!(events(&batch), [AppEvent::LinkDown]);
    assert_eq!(sup.session_state(), LinkState::Down { dormant: false });
}

#[test]
fn loss_reports_are_idempotent() {
    let mut sup = session_up(0);
    assert_eq!(events(&sup.on_transport_lost(100)).len(), 2);
    // Repeated hints (e.g. from state entry actions) change nothing.
    assert!(events(&sup.on_transport_lost(200)).is_empty());
    assert!(events(&sup.on_session_lost(200)).is_empty());
}

#[test]
fn session_loss_reconnects_while_transport_holds() {
    let mut sup = session_up(0);

    let batch = sup.on_session_lost(5_000);
    assert_eq!(events(&batch), [AppEvent::SessionDown]);
    assert_eq!(sup.session_state(), LinkState::Connecting { attempt: 0 });
    assert_eq!(sup.next_command(5_000), LinkCommand::ConnectSession);
}

#[test]
fn recovery_after_loss_reaches_session_up_again() {
    let mut sup = session_up(0);
    sup.on_transport_lost(1_000);

    let batch = sup.on_transport_result(true, 2_000);
    assert_eq!(events(&batch), [AppEvent::LinkUp]);
    let batch = sup.on_session_result(true, 2_000);
    assert_eq!(events(&batch), [AppEvent::SessionUp]);
    assert!(sup.transport_state().is_up());
    assert!(sup.session_state().is_up());
    assert_eq!(sup.next_command(2_000), LinkCommand::Idle);
}
