//! Producer side of the audio pipeline.

use core::fmt::Debug;
use core::sync::atomic::Ordering;

use embassy_time::Timer;
use log::{debug, info, warn};

use capnote_core::audio::CaptureSource;

/// The capture gate is checked at every frame boundary, so a stop is
/// effective before the next production attempt. The source keeps being
/// drained while capture is off to keep the DMA ring fresh; the frames are
/// simply discarded.
pub async fn capture_loop<S>(mic: Option<S>) -> !
where
    S: CaptureSource,
    S::Error: Debug,
{
    let Some(mut mic) = mic else {
        warn!("audio capture unavailable; running degraded");
        loop {
            Timer::after_secs(3600).await;
        }
    };

    let mut was_capturing = false;
    loop {
        mic.set_gain_percent(crate::MIC_GAIN_PERCENT.load(Ordering::Acquire));
        let frame = match mic.read_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                // Unrecoverable: halt this subsystem rather than pretend
                // capture still works. UI and connectivity keep running.
                warn!("mic read failed: {:?}; audio capture halted", err);
                loop {
                    Timer::after_secs(3600).await;
                }
            }
        };

        let capturing = crate::CAPTURE_ENABLED.load(Ordering::Acquire);
        if capturing != was_capturing {
            info!(
                "audio production {}",
                if capturing { "started" } else { "stopped" }
            );
            was_capturing = capturing;
        }
        if capturing && !crate::AUDIO_CHANNEL.try_push(frame) {
            debug!("audio channel full; frame dropped");
        }
    }
}
