use embedded_hal::digital::OutputPin;

/// Board status LED. The polarity flag covers both direct-drive and
/// sink-driven wirings.
#[derive(Debug)]
pub struct StatusLed<PIN> {
    pin: PIN,
    active_low: bool,
}

impl<PIN> StatusLed<PIN>
where
    PIN: OutputPin,
{
    pub fn new(mut pin: PIN, active_low: bool) -> Result<Self, PIN::Error> {
        if active_low {
            pin.set_high()?;
        } else {
            pin.set_low()?;
        }
        Ok(Self { pin, active_low })
    }

    /// Drive the LED to the given logical level (true = lit).
    pub fn set_level(&mut self, on: bool) -> Result<(), PIN::Error> {
        if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}
