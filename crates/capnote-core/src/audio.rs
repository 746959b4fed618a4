//! Audio frames and the capture-to-network channel.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

pub const SAMPLE_RATE_HZ: u32 = 16_000;
/// Mono capture from the left PDM microphone.
pub const CHANNELS: usize = 1;
pub const BITS_PER_SAMPLE: usize = 16;
pub const FRAME_DURATION_MS: u32 = 40;
pub const SAMPLES_PER_FRAME: usize =
    (SAMPLE_RATE_HZ as usize * FRAME_DURATION_MS as usize) / 1_000;
pub const FRAME_SAMPLES: usize = SAMPLES_PER_FRAME * CHANNELS;
pub const FRAME_BYTES: usize = FRAME_SAMPLES * (BITS_PER_SAMPLE / 8);
/// 50 frames of 40 ms ≈ 2 s of buffered audio.
pub const AUDIO_QUEUE_DEPTH: usize = 50;

/// One fixed-duration slice of captured audio, interleaved 16-bit samples.
/// Immutable once produced; copied into the channel slot on enqueue because
/// the producer reuses its capture buffer for the next cycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AudioFrame {
    samples: [i16; FRAME_SAMPLES],
    samples_per_channel: u16,
}

impl AudioFrame {
    pub const fn silent() -> Self {
        Self {
            samples: [0; FRAME_SAMPLES],
            samples_per_channel: SAMPLES_PER_FRAME as u16,
        }
    }

    pub const fn from_samples(samples: [i16; FRAME_SAMPLES]) -> Self {
        Self {
            samples,
            samples_per_channel: SAMPLES_PER_FRAME as u16,
        }
    }

    /// A frame carrying fewer samples than the nominal duration (e.g. the
    /// tail of a capture run).
    pub fn truncated(samples: [i16; FRAME_SAMPLES], samples_per_channel: u16) -> Self {
        let clamped = samples_per_channel.min(SAMPLES_PER_FRAME as u16);
        Self {
            samples,
            samples_per_channel: clamped,
        }
    }

    pub const fn samples_per_channel(&self) -> u16 {
        self.samples_per_channel
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.samples_per_channel as usize * CHANNELS]
    }

    pub fn payload_len(&self) -> usize {
        self.samples().len() * (BITS_PER_SAMPLE / 8)
    }

    /// Serialize as little-endian PCM for publishing; returns bytes written.
    pub fn copy_to_le_bytes(&self, out: &mut [u8]) -> usize {
        let mut written = 0;
        for (chunk, sample) in out.chunks_exact_mut(2).zip(self.samples()) {
            chunk.copy_from_slice(&sample.to_le_bytes());
            written += 2;
        }
        written
    }
}

impl Default for AudioFrame {
    fn default() -> Self {
        Self::silent()
    }
}

/// Fixed-capacity FIFO bridging the capture context to the network worker.
///
/// Single producer, single consumer, both fixed for the process lifetime.
/// Operations take an internal lock only for O(1) work, so `try_push` is
/// safe from the capture-completion context. A full channel drops the new
/// frame silently: stale audio has no value in a live stream, so
/// newest-dropped is the intended policy, not a defect.
pub struct AudioChannel<const N: usize> {
    frames: Mutex<RefCell<Deque<AudioFrame, N>>>,
}

impl<const N: usize> AudioChannel<N> {
    pub const fn new() -> Self {
        Self {
            frames: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Non-blocking enqueue; returns false when the frame was dropped.
    pub fn try_push(&self, frame: AudioFrame) -> bool {
        critical_section::with(|cs| self.frames.borrow_ref_mut(cs).push_back(frame).is_ok())
    }

    /// Non-blocking dequeue in FIFO order. The consumer bounds its own wait
    /// between polls so connectivity events stay timely.
    pub fn try_pop(&self) -> Option<AudioFrame> {
        critical_section::with(|cs| self.frames.borrow_ref_mut(cs).pop_front())
    }

    /// Approximate occupancy for flow decisions.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.frames.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for AudioChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The capture-source boundary: delivers frames at the cadence derived from
/// sample rate and frame duration; an error means "stop production".
#[allow(async_fn_in_trait)]
pub trait CaptureSource {
    type Error;

    async fn read_frame(&mut self) -> Result<AudioFrame, Self::Error>;

    /// Capture gain as a percent of unity; sources without one ignore it.
    fn set_gain_percent(&mut self, _percent: u8) {}
}
