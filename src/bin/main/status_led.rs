//! Drives the status LED from the shared indicator state.

use core::fmt::Debug;

use embassy_time::{Instant, Timer};
use embedded_hal::digital::OutputPin;
use log::debug;

use capnote_hal_esp32s3::led::StatusLed;

/// Fast enough to hit the 250 ms fast-blink edges without visible jitter.
const LED_POLL_MS: u64 = 25;

pub async fn led_loop<PIN>(mut led: StatusLed<PIN>) -> !
where
    PIN: OutputPin,
    PIN::Error: Debug,
{
    let mut last_written: Option<bool> = None;

    loop {
        let now_ms = Instant::now().as_millis();
        let level = critical_section::with(|cs| {
            let mut indicator = crate::INDICATOR.borrow_ref_mut(cs);
            indicator.poll(now_ms);
            indicator.level()
        });

        if last_written != Some(level) {
            match led.set_level(level) {
                Ok(()) => last_written = Some(level),
                Err(err) => debug!("led write failed: {:?}", err),
            }
        }

        Timer::after_millis(LED_POLL_MS).await;
    }
}
