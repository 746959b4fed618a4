//! Status LED patterns and their toggle schedule.

use crate::app::OperatingState;

pub const SLOW_BLINK_PERIOD_MS: u64 = 1_000;
pub const FAST_BLINK_PERIOD_MS: u64 = 250;

/// Blink pattern shown on the status LED; a pure function of the operating
/// state, recomputed on every state entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndicatorPattern {
    Off,
    SolidOn,
    SlowBlink,
    FastBlink,
}

impl IndicatorPattern {
    pub const fn for_state(state: OperatingState) -> Self {
        match state {
            OperatingState::LinkDown | OperatingState::SessionDown => Self::FastBlink,
            OperatingState::Idle => Self::Off,
            OperatingState::Capturing => Self::SlowBlink,
            OperatingState::CapturePaused => Self::SolidOn,
        }
    }

    pub const fn toggle_period_ms(self) -> Option<u64> {
        match self {
            Self::Off | Self::SolidOn => None,
            Self::SlowBlink => Some(SLOW_BLINK_PERIOD_MS),
            Self::FastBlink => Some(FAST_BLINK_PERIOD_MS),
        }
    }

    /// Blink patterns always start in the "on" phase.
    const fn initial_level(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Deadline-polled blink scheduler. The LED task calls [`LedIndicator::poll`]
/// on its own cadence and writes [`LedIndicator::level`] to the pin.
#[derive(Debug)]
pub struct LedIndicator {
    pattern: IndicatorPattern,
    level: bool,
    next_toggle_ms: Option<u64>,
}

impl LedIndicator {
    pub const fn new() -> Self {
        Self {
            pattern: IndicatorPattern::Off,
            level: false,
            next_toggle_ms: None,
        }
    }

    pub const fn pattern(&self) -> IndicatorPattern {
        self.pattern
    }

    /// Current physical level (true = lit).
    pub const fn level(&self) -> bool {
        self.level
    }

    /// Reconfigure the pattern. Re-setting the already-active periodic
    /// pattern keeps its phase; anything else restarts in the "on" phase
    /// (or sets the steady level once for `Off`/`SolidOn`).
    pub fn set_pattern(&mut self, pattern: IndicatorPattern, now_ms: u64) {
        if pattern == self.pattern && self.next_toggle_ms.is_some() {
            return;
        }
        self.pattern = pattern;
        self.level = pattern.initial_level();
        self.next_toggle_ms = pattern.toggle_period_ms().map(|period| now_ms + period);
    }

    /// Advance the toggle schedule; returns the new level when it flipped.
    pub fn poll(&mut self, now_ms: u64) -> Option<bool> {
        let period = self.pattern.toggle_period_ms()?;
        let deadline = self.next_toggle_ms?;
        if now_ms < deadline {
            return None;
        }
        self.level = !self.level;
        self.next_toggle_ms = Some(now_ms + period);
        Some(self.level)
    }
}

impl Default for LedIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_follows_operating_state() {
        assert_eq!(
            IndicatorPattern::for_state(OperatingState::LinkDown),
            IndicatorPattern::FastBlink
        );
        assert_eq!(
            IndicatorPattern::for_state(OperatingState::SessionDown),
            IndicatorPattern::FastBlink
        );
        assert_eq!(
            IndicatorPattern::for_state(OperatingState::Idle),
            IndicatorPattern::Off
        );
        assert_eq!(
            IndicatorPattern::for_state(OperatingState::Capturing),
            IndicatorPattern::SlowBlink
        );
        assert_eq!(
            IndicatorPattern::for_state(OperatingState::CapturePaused),
            IndicatorPattern::SolidOn
        );
    }

    #[test]
    fn fast_blink_starts_on_and_toggles_every_period() {
        let mut led = LedIndicator::new();
        led.set_pattern(IndicatorPattern::FastBlink, 0);
        assert!(led.level());

        assert_eq!(led.poll(100), None);
        assert_eq!(led.poll(250), Some(false));
        assert_eq!(led.poll(400), None);
        assert_eq!(led.poll(500), Some(true));
    }

    #[test]
    fn resetting_the_active_blink_pattern_keeps_phase() {
        let mut led = LedIndicator::new();
        led.set_pattern(IndicatorPattern::SlowBlink, 0);
        assert_eq!(led.poll(1_000), Some(false));

        // Same pattern again mid-period: deadline must not move.
        led.set_pattern(IndicatorPattern::SlowBlink, 1_500);
        assert_eq!(led.poll(1_900), None);
        assert_eq!(led.poll(2_000), Some(true));
    }

    #[test]
    fn steady_patterns_stop_the_toggle() {
        let mut led = LedIndicator::new();
        led.set_pattern(IndicatorPattern::FastBlink, 0);
        led.set_pattern(IndicatorPattern::SolidOn, 100);
        assert!(led.level());
        assert_eq!(led.poll(10_000), None);

        led.set_pattern(IndicatorPattern::Off, 200);
        assert!(!led.level());
        assert_eq!(led.poll(20_000), None);
    }

    #[test]
    fn switching_blink_patterns_restarts_in_on_phase() {
        let mut led = LedIndicator::new();
        led.set_pattern(IndicatorPattern::SlowBlink, 0);
        assert_eq!(led.poll(1_000), Some(false));

        led.set_pattern(IndicatorPattern::FastBlink, 1_100);
        assert!(led.level());
        assert_eq!(led.poll(1_349), None);
        assert_eq!(led.poll(1_350), Some(false));
    }
}
