//! PDM microphone capture over the ESP32-S3 I2S peripheral.
//!
//! The I2S RX path runs a circular DMA transfer; this adapter drains the
//! ring, assembles fixed-duration frames, and applies the slider-controlled
//! software gain. The transfer is created in `main` (it owns the DMA buffer
//! for its whole lifetime) and handed over here.

use capnote_core::audio::{AudioFrame, CaptureSource, FRAME_BYTES, FRAME_SAMPLES};
use esp_hal::i2s::master::{Error as I2sError, I2sReadDmaTransferAsync};

/// DMA ring sized for a few frames of slack between task wakeups.
pub const MIC_DMA_BUFFER_BYTES: usize = FRAME_BYTES * 4;

pub struct PdmMic<'d> {
    transfer: I2sReadDmaTransferAsync<'d, &'static mut [u8]>,
    pending: [u8; FRAME_BYTES],
    filled: usize,
    gain_percent: u8,
}

impl<'d> PdmMic<'d> {
    pub fn new(transfer: I2sReadDmaTransferAsync<'d, &'static mut [u8]>) -> Self {
        Self {
            transfer,
            pending: [0; FRAME_BYTES],
            filled: 0,
            gain_percent: 100,
        }
    }

    fn assemble(&mut self) -> AudioFrame {
        let mut samples = [0i16; FRAME_SAMPLES];
        for (sample, bytes) in samples.iter_mut().zip(self.pending.chunks_exact(2)) {
            let raw = i16::from_le_bytes([bytes[0], bytes[1]]);
            *sample = apply_gain(raw, self.gain_percent);
        }
        self.filled = 0;
        AudioFrame::from_samples(samples)
    }
}

fn apply_gain(sample: i16, gain_percent: u8) -> i16 {
    (i32::from(sample) * i32::from(gain_percent) / 100) as i16
}

impl CaptureSource for PdmMic<'_> {
    type Error = I2sError;

    async fn read_frame(&mut self) -> Result<AudioFrame, I2sError> {
        while self.filled < FRAME_BYTES {
            let read = self.transfer.pop(&mut self.pending[self.filled..]).await?;
            self.filled += read;
        }
        Ok(self.assemble())
    }

    /// Software gain applied per sample. 100 is unity; larger values clamp.
    fn set_gain_percent(&mut self, percent: u8) {
        self.gain_percent = percent.min(100);
    }
}
