use super::{TouchSample, TouchScanner};

/// No-hardware scanner used during bring-up.
#[derive(Default, Debug, Clone, Copy)]
pub struct MockScanner;

impl MockScanner {
    pub const fn new() -> Self {
        Self
    }
}

impl TouchScanner for MockScanner {
    type Error = core::convert::Infallible;

    fn poll_sample(&mut self) -> Result<Option<TouchSample>, Self::Error> {
        Ok(Some(TouchSample::default()))
    }
}
