//! Touch input edge detection: button events and slider volume.

use heapless::Vec;
use log::debug;

use crate::app::AppEvent;

/// Scan cadence of the sensing engine.
pub const SCAN_INTERVAL_MS: u64 = 20;
pub const LONG_PRESS_THRESHOLD_MS: u64 = 2_000;

/// One raw scan-cycle sample from the sensing engine. `slider` is `Some`
/// only while the slider is touched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TouchSample {
    pub primary_active: bool,
    pub secondary_active: bool,
    pub slider: Option<u16>,
}

/// What one scan cycle produced. `volume` bypasses the state machine: it
/// goes straight to the microphone gain and the operator display.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanOutcome {
    pub events: Vec<AppEvent, 2>,
    pub volume: Option<u8>,
}

/// The sensing-engine boundary. `Ok(None)` means the engine was busy and no
/// fresh sample is available this cycle.
pub trait TouchScanner {
    type Error;

    fn poll_sample(&mut self) -> Result<Option<TouchSample>, Self::Error>;
}

/// Converts raw per-cycle samples into discrete edges. Never blocks; runs
/// once per scan cycle on whatever cadence the sensing engine provides.
#[derive(Debug)]
pub struct InputDebouncer {
    slider_resolution: u16,
    prev_primary: bool,
    prev_secondary: bool,
    long_press_armed: bool,
    secondary_pressed_at_ms: u64,
    prev_slider: Option<u16>,
}

impl InputDebouncer {
    pub const fn new(slider_resolution: u16) -> Self {
        Self {
            slider_resolution,
            prev_primary: false,
            prev_secondary: false,
            long_press_armed: false,
            secondary_pressed_at_ms: 0,
            prev_slider: None,
        }
    }

    pub fn on_sample(&mut self, sample: TouchSample, now_ms: u64) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        if sample.primary_active && !self.prev_primary {
            debug!("primary pressed");
            let _ = outcome.events.push(AppEvent::PrimaryPressed);
        }

        if sample.secondary_active && !self.prev_secondary {
            self.long_press_armed = true;
            self.secondary_pressed_at_ms = now_ms;
        }
        if sample.secondary_active
            && self.long_press_armed
            && now_ms.saturating_sub(self.secondary_pressed_at_ms) >= LONG_PRESS_THRESHOLD_MS
        {
            debug!("secondary long press");
            let _ = outcome.events.push(AppEvent::SecondaryLongPressed);
            // Fire once per press; re-arming needs a fresh rising edge.
            self.long_press_armed = false;
        }
        if !sample.secondary_active && self.prev_secondary {
            // Released before the threshold: a short press has no bound
            // action, so disarm silently.
            self.long_press_armed = false;
        }

        match sample.slider {
            Some(position) if self.prev_slider != Some(position) => {
                outcome.volume = Some(self.volume_percent(position));
                self.prev_slider = Some(position);
            }
            Some(_) => {}
            None => self.prev_slider = None,
        }

        self.prev_primary = sample.primary_active;
        self.prev_secondary = sample.secondary_active;
        outcome
    }

    fn volume_percent(&self, position: u16) -> u8 {
        if self.slider_resolution == 0 {
            return 0;
        }
        let percent = u32::from(position) * 100 / u32::from(self.slider_resolution);
        percent.min(100) as u8
    }
}

pub mod mock;

#[cfg(test)]
mod tests;
