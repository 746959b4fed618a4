//! Touch scan loop: raw samples through the debouncer, out as state-machine
//! events plus volume forwarding.

use core::fmt::Debug;
use core::sync::atomic::Ordering;

use embassy_time::{Instant, Timer};
use log::{debug, info};

use capnote_core::input::{InputDebouncer, SCAN_INTERVAL_MS, TouchScanner};

pub async fn ui_loop<S>(mut scanner: S, slider_resolution: u16) -> !
where
    S: TouchScanner,
    S::Error: Debug,
{
    let mut debouncer = InputDebouncer::new(slider_resolution);

    loop {
        let now_ms = Instant::now().as_millis();
        match scanner.poll_sample() {
            Ok(Some(sample)) => {
                let outcome = debouncer.on_sample(sample, now_ms);
                for event in outcome.events {
                    crate::dispatch_event(event);
                }
                if let Some(volume) = outcome.volume {
                    // Volume bypasses the state machine: straight to the mic
                    // gain, with the log line standing in for a display.
                    crate::MIC_GAIN_PERCENT.store(volume, Ordering::Release);
                    info!("volume: {}%", volume);
                }
            }
            // Sensing engine busy; try again next cycle.
            Ok(None) => {}
            Err(err) => debug!("touch scan failed: {:?}", err),
        }

        Timer::after_millis(SCAN_INTERVAL_MS).await;
    }
}
