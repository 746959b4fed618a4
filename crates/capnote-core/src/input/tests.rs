use super::*;

fn idle() -> TouchSample {
    TouchSample::default()
}

fn primary() -> TouchSample {
    TouchSample {
        primary_active: true,
        ..TouchSample::default()
    }
}

fn secondary() -> TouchSample {
    TouchSample {
        secondary_active: true,
        ..TouchSample::default()
    }
}

fn slider(position: u16) -> TouchSample {
    TouchSample {
        slider: Some(position),
        ..TouchSample::default()
    }
}

#[test]
fn primary_rising_edge_fires_once() {
    let mut deb = InputDebouncer::new(100);

    let outcome = deb.on_sample(primary(), 0);
    assert_eq!(outcome.events.as_slice(), [AppEvent::PrimaryPressed]);

    // Held: no repeat.
    for t in 1..10 {
        let outcome = deb.on_sample(primary(), t * SCAN_INTERVAL_MS);
        assert!(outcome.events.is_empty());
    }

    // Release and press again: a fresh edge.
    assert!(deb.on_sample(idle(), 200).events.is_empty());
    let outcome = deb.on_sample(primary(), 220);
    assert_eq!(outcome.events.as_slice(), [AppEvent::PrimaryPressed]);
}

#[test]
fn secondary_hold_of_exactly_threshold_fires_once() {
    let mut deb = InputDebouncer::new(100);

    assert!(deb.on_sample(secondary(), 0).events.is_empty());
    assert!(deb.on_sample(secondary(), 1_999).events.is_empty());

    let outcome = deb.on_sample(secondary(), 2_000);
    assert_eq!(outcome.events.as_slice(), [AppEvent::SecondaryLongPressed]);

    // Still held well past the threshold: fired exactly once.
    for t in [2_020, 3_000, 10_000] {
        assert!(deb.on_sample(secondary(), t).events.is_empty());
    }
}

#[test]
fn short_secondary_press_emits_nothing() {
    let mut deb = InputDebouncer::new(100);

    assert!(deb.on_sample(secondary(), 0).events.is_empty());
    assert!(deb.on_sample(secondary(), 1_999).events.is_empty());
    assert!(deb.on_sample(idle(), 2_005).events.is_empty());
    // The elapsed threshold passing after release must not fire.
    assert!(deb.on_sample(idle(), 3_000).events.is_empty());
}

#[test]
fn long_press_rearms_on_a_fresh_rising_edge() {
    let mut deb = InputDebouncer::new(100);

    deb.on_sample(secondary(), 0);
    assert_eq!(
        deb.on_sample(secondary(), 2_000).events.as_slice(),
        [AppEvent::SecondaryLongPressed]
    );

    deb.on_sample(idle(), 2_100);
    deb.on_sample(secondary(), 2_200);
    assert!(deb.on_sample(secondary(), 4_000).events.is_empty());
    assert_eq!(
        deb.on_sample(secondary(), 4_200).events.as_slice(),
        [AppEvent::SecondaryLongPressed]
    );
}

#[test]
fn both_buttons_can_fire_in_one_cycle() {
    let mut deb = InputDebouncer::new(100);

    deb.on_sample(secondary(), 0);
    let sample = TouchSample {
        primary_active: true,
        secondary_active: true,
        slider: None,
    };
    let outcome = deb.on_sample(sample, 2_000);
    assert_eq!(
        outcome.events.as_slice(),
        [AppEvent::PrimaryPressed, AppEvent::SecondaryLongPressed]
    );
}

#[test]
fn slider_changes_scale_to_percent() {
    let mut deb = InputDebouncer::new(100);

    assert_eq!(deb.on_sample(slider(50), 0).volume, Some(50));
    // Unchanged position: no spurious update.
    assert_eq!(deb.on_sample(slider(50), 20).volume, None);
    assert_eq!(deb.on_sample(slider(75), 40).volume, Some(75));
    // Values past the resolution clamp at 100.
    assert_eq!(deb.on_sample(slider(300), 60).volume, Some(100));
}

#[test]
fn slider_release_resets_tracking() {
    let mut deb = InputDebouncer::new(100);

    assert_eq!(deb.on_sample(slider(30), 0).volume, Some(30));
    assert_eq!(deb.on_sample(idle(), 20).volume, None);
    // Touching the same position again counts as a change.
    assert_eq!(deb.on_sample(slider(30), 40).volume, Some(30));
}

#[test]
fn slider_updates_never_become_state_machine_events() {
    let mut deb = InputDebouncer::new(100);
    let outcome = deb.on_sample(slider(10), 0);
    assert!(outcome.events.is_empty());
    assert_eq!(outcome.volume, Some(10));
}

#[test]
fn zero_resolution_is_safe() {
    let mut deb = InputDebouncer::new(0);
    assert_eq!(deb.on_sample(slider(40), 0).volume, Some(0));
}
