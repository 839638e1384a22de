//! Video decoder contract (§4.7): the register-level picture-quality surface
//! and signal-presence detection. Register sequencing beyond these four
//! picture-quality registers and the status check is out of scope; this
//! module states the contract, not a full driver.

use crate::config::{Tunables, VideoSource};

/// The two-wire control-bus register address exposed by the picture-quality
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum Register {
    Brightness,
    Saturation,
    Hue,
    Contrast,
}

/// Status register bit mask: color lock, vsync lock, hsync lock.
const SIGNAL_LOCK_MASK: u8 = 0x0E;

/// Consecutive failed checks required before declaring the signal lost.
const LOSS_DEBOUNCE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum SignalState {
    Present,
    Lost,
}

/// Mirrors the four picture-quality registers last written to the decoder
/// plus the debounced signal-presence state, so the pipeline writes a
/// register only when the corresponding tunable actually changed.
pub struct DecoderShadow {
    last_written: Tunables,
    state: SignalState,
    consecutive_losses: u8,
}

impl DecoderShadow {
    pub fn new(initial: Tunables) -> Self {
        Self { last_written: initial, state: SignalState::Present, consecutive_losses: 0 }
    }

    /// Derive the register writes needed to bring the decoder in line with
    /// `current`, comparing against the last-written shadow. Only changed
    /// registers are returned; the contract does not re-write unchanged
    /// registers every frame.
    pub fn picture_quality_registers(
        &mut self,
        current: &Tunables,
    ) -> heapless::Vec<(Register, u8), 4> {
        let mut writes = heapless::Vec::new();
        if current.brightness != self.last_written.brightness {
            let _ = writes.push((Register::Brightness, current.brightness));
        }
        if current.saturation != self.last_written.saturation {
            let _ = writes.push((Register::Saturation, current.saturation));
        }
        if current.hue != self.last_written.hue {
            let _ = writes.push((Register::Hue, current.hue));
        }
        if current.contrast != self.last_written.contrast {
            let _ = writes.push((Register::Contrast, current.contrast));
        }
        self.last_written = *current;
        writes
    }

    /// Apply the `0x0E` signal-lock mask to a raw status register read.
    pub fn signal_present(status_register: u8) -> bool {
        status_register & SIGNAL_LOCK_MASK == SIGNAL_LOCK_MASK
    }

    /// Feed one status-register observation (taken once per field) and
    /// return the debounced signal state, flipping to `Lost` only after
    /// five consecutive failed checks and back to `Present` immediately.
    pub fn observe(&mut self, status_register: u8) -> SignalState {
        if Self::signal_present(status_register) {
            self.consecutive_losses = 0;
            self.state = SignalState::Present;
        } else {
            self.consecutive_losses = self.consecutive_losses.saturating_add(1);
            if self.consecutive_losses >= LOSS_DEBOUNCE {
                self.state = SignalState::Lost;
            }
        }
        self.state
    }
}

pub const fn video_source_select_value(source: VideoSource) -> u8 {
    match source {
        | VideoSource::Auto => 0,
        | VideoSource::Fixed1 => 1,
        | VideoSource::Fixed2 => 2,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unchanged_tunables_write_nothing() {
        let t = Tunables::default();
        let mut shadow = DecoderShadow::new(t);
        assert!(shadow.picture_quality_registers(&t).is_empty());
    }

    #[test]
    fn a_changed_tunable_writes_only_its_register() {
        let mut t = Tunables::default();
        let mut shadow = DecoderShadow::new(t);
        t.set_hue(200);
        let writes = shadow.picture_quality_registers(&t);
        assert_eq!(writes.as_slice(), &[(Register::Hue, 200)]);
    }

    #[test]
    fn signal_present_requires_all_three_lock_bits() {
        assert!(DecoderShadow::signal_present(0x0E));
        assert!(!DecoderShadow::signal_present(0x0C));
        assert!(!DecoderShadow::signal_present(0x00));
    }

    #[test]
    fn signal_loss_debounces_over_five_checks_then_recovers_immediately() {
        let mut shadow = DecoderShadow::new(Tunables::default());
        for _ in 0..4 {
            assert_eq!(shadow.observe(0x00), SignalState::Present);
        }
        assert_eq!(shadow.observe(0x00), SignalState::Lost);
        assert_eq!(shadow.observe(0x0E), SignalState::Present);
    }
}
