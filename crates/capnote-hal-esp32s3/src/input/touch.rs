use embedded_hal::digital::InputPin;

use capnote_core::input::{TouchSample, TouchScanner};

#[derive(Debug, Clone, Copy)]
pub struct TouchConfig {
    buttons_active_low: bool,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            buttons_active_low: true,
        }
    }
}

impl TouchConfig {
    pub const fn with_buttons_active_low(mut self, buttons_active_low: bool) -> Self {
        self.buttons_active_low = buttons_active_low;
        self
    }
}

#[derive(Debug)]
pub enum TouchScanError<PrimaryErr, SecondaryErr> {
    Primary(PrimaryErr),
    Secondary(SecondaryErr),
}

/// Two-button touch frontend sampled over GPIO. The board routes the sensing
/// controller's per-pad outputs to plain digital pins, so a scan cycle is a
/// pair of level reads; the slider pad is not wired on this board and always
/// reads as untouched.
#[derive(Debug)]
pub struct GpioTouchScanner<PRIMARY, SECONDARY> {
    primary: PRIMARY,
    secondary: SECONDARY,
    config: TouchConfig,
}

impl<PRIMARY, SECONDARY> GpioTouchScanner<PRIMARY, SECONDARY>
where
    PRIMARY: InputPin,
    SECONDARY: InputPin,
{
    pub fn new(primary: PRIMARY, secondary: SECONDARY, config: TouchConfig) -> Self {
        Self {
            primary,
            secondary,
            config,
        }
    }

    fn active(&self, level_high: bool) -> bool {
        if self.config.buttons_active_low {
            !level_high
        } else {
            level_high
        }
    }
}

impl<PRIMARY, SECONDARY> TouchScanner for GpioTouchScanner<PRIMARY, SECONDARY>
where
    PRIMARY: InputPin,
    SECONDARY: InputPin,
{
    type Error = TouchScanError<PRIMARY::Error, SECONDARY::Error>;

    fn poll_sample(&mut self) -> Result<Option<TouchSample>, Self::Error> {
        let primary_high = self.primary.is_high().map_err(TouchScanError::Primary)?;
        let secondary_high = self.secondary.is_high().map_err(TouchScanError::Secondary)?;

        Ok(Some(TouchSample {
            primary_active: self.active(primary_high),
            secondary_active: self.active(secondary_high),
            slider: None,
        }))
    }
}
