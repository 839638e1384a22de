//! IR remote contract (§4.11): the NEC protocol bit-level state machine.
//!
//! Input is the duration, in microseconds, between consecutive falling
//! edges of the demodulated IR receiver output - what the capture-timer
//! peripheral would hand the foreground after each edge. Programming that
//! timer (its prescaler, input-capture channel, slave-reset mode) is out of
//! scope, mirroring the decoder and serializer contracts: only the bit-level
//! protocol decode lives here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum Status {
    Nothing,
    Pressed,
    AutoRepeat,
    Released,
    Checked,
}

const HEADER_TOTAL: u32 = 13_500;
const HEADER_TOL: u32 = 1_500;
const REPEAT_TOTAL: u32 = 11_250;
const REPEAT_TOL: u32 = 1_000;
const ZERO_TOTAL: u32 = 1_125;
const ONE_TOTAL: u32 = 2_250;
const BIT_TOL: u32 = 300;

/// Consecutive repeat frames (each ~108ms apart) before auto-repeat begins.
const AUTO_REPEAT_INITIAL: u8 = 14; // ~1.5s / 108ms
/// Then one synthesized auto-repeat event every this many repeat frames.
const AUTO_REPEAT_PERIOD: u8 = 8;

fn within(value: u32, center: u32, tol: u32) -> bool {
    value.abs_diff(center) <= tol
}

enum EdgeKind {
    Header,
    Repeat,
    Zero,
    One,
    Noise,
}

fn classify(interval_us: u32) -> EdgeKind {
    if within(interval_us, HEADER_TOTAL, HEADER_TOL) {
        EdgeKind::Header
    } else if within(interval_us, REPEAT_TOTAL, REPEAT_TOL) {
        EdgeKind::Repeat
    } else if within(interval_us, ZERO_TOTAL, BIT_TOL) {
        EdgeKind::Zero
    } else if within(interval_us, ONE_TOTAL, BIT_TOL) {
        EdgeKind::One
    } else {
        EdgeKind::Noise
    }
}

enum Phase {
    Idle,
    Receiving { bits: u8, data: u32 },
}

/// NEC decoder state. One instance per IR receiver.
pub struct IrDecoder {
    phase: Phase,
    pub address: u8,
    pub command: u8,
    repeat_count: u8,
}

impl IrDecoder {
    pub const fn new() -> Self {
        Self { phase: Phase::Idle, address: 0, command: 0, repeat_count: 0 }
    }

    /// Feed one inter-edge interval. Returns the status to report for this
    /// edge; `Nothing` most of the time, `Pressed`/`AutoRepeat` when a frame
    /// completes, `Checked` is left to the caller (it means "already
    /// consumed", for a caller that wants edge-triggered semantics).
    pub fn edge(&mut self, interval_us: u32) -> Status {
        match classify(interval_us) {
            | EdgeKind::Noise => {
                self.phase = Phase::Idle;
                Status::Nothing
            }
            | EdgeKind::Header => {
                self.phase = Phase::Receiving { bits: 0, data: 0 };
                Status::Nothing
            }
            | EdgeKind::Repeat => {
                if self.repeat_count == 0 {
                    // No code latched yet: a repeat with nothing to repeat is noise.
                    return Status::Nothing;
                }
                self.repeat_count = self.repeat_count.saturating_add(1);
                if self.repeat_count == AUTO_REPEAT_INITIAL
                    || (self.repeat_count > AUTO_REPEAT_INITIAL
                        && (self.repeat_count - AUTO_REPEAT_INITIAL) % AUTO_REPEAT_PERIOD == 0)
                {
                    Status::AutoRepeat
                } else {
                    Status::Nothing
                }
            }
            | EdgeKind::Zero | EdgeKind::One => {
                let bit = matches!(classify(interval_us), EdgeKind::One);
                self.receive_bit(bit)
            }
        }
    }

    /// Called by the timer-overflow path (>200ms since the last edge): the
    /// key has been released.
    pub fn timeout(&mut self) -> Status {
        self.phase = Phase::Idle;
        if self.repeat_count > 0 {
            self.repeat_count = 0;
            Status::Released
        } else {
            Status::Nothing
        }
    }

    fn receive_bit(&mut self, bit: bool) -> Status {
        let Phase::Receiving { bits, data } = &mut self.phase else {
            return Status::Nothing;
        };
        *data >>= 1;
        if bit {
            *data |= 0x8000_0000;
        }
        *bits += 1;

        if *bits < 32 {
            return Status::Nothing;
        }

        let frame = *data;
        self.phase = Phase::Idle;

        let addr = (frame & 0xff) as u8;
        let addr_inv = ((frame >> 8) & 0xff) as u8;
        let cmd = ((frame >> 16) & 0xff) as u8;
        let cmd_inv = ((frame >> 24) & 0xff) as u8;

        if addr ^ addr_inv != 0xff || cmd ^ cmd_inv != 0xff {
            return Status::Nothing;
        }

        self.address = addr;
        self.command = cmd;
        self.repeat_count = 1;
        Status::Pressed
    }
}

impl Default for IrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn send_frame(dec: &mut IrDecoder, addr: u8, cmd: u8) -> Status {
        dec.edge(HEADER_TOTAL);
        let frame = (addr as u32) | ((!addr as u32) << 8) | ((cmd as u32) << 16) | ((!cmd as u32) << 24);
        let mut status = Status::Nothing;
        for i in 0..32 {
            let bit = (frame >> i) & 1 != 0;
            status = dec.edge(if bit { ONE_TOTAL } else { ZERO_TOTAL });
        }
        status
    }

    #[test]
    fn a_valid_frame_is_pressed_and_latches_address_and_command() {
        let mut dec = IrDecoder::new();
        let status = send_frame(&mut dec, 0x00, 0x45);
        assert_eq!(status, Status::Pressed);
        assert_eq!(dec.address, 0x00);
        assert_eq!(dec.command, 0x45);
    }

    #[test]
    fn a_frame_whose_complement_check_fails_is_discarded() {
        let mut dec = IrDecoder::new();
        dec.edge(HEADER_TOTAL);
        // Corrupt: command and its "complement" both equal 0x45.
        let frame: u32 = 0x00 | (0xff << 8) | (0x45 << 16) | (0x45 << 24);
        let mut status = Status::Nothing;
        for i in 0..32 {
            let bit = (frame >> i) & 1 != 0;
            status = dec.edge(if bit { ONE_TOTAL } else { ZERO_TOTAL });
        }
        assert_eq!(status, Status::Nothing);
        assert_eq!(dec.address, 0);
        assert_eq!(dec.command, 0);
    }

    #[test]
    fn repeat_without_a_prior_code_is_ignored() {
        let mut dec = IrDecoder::new();
        assert_eq!(dec.edge(REPEAT_TOTAL), Status::Nothing);
    }

    #[test]
    fn timeout_after_a_pressed_code_reports_released() {
        let mut dec = IrDecoder::new();
        send_frame(&mut dec, 0x00, 0x45);
        assert_eq!(dec.timeout(), Status::Released);
    }

    #[test]
    fn noise_interval_resets_mid_frame_reception() {
        let mut dec = IrDecoder::new();
        dec.edge(HEADER_TOTAL);
        dec.edge(ZERO_TOTAL);
        dec.edge(999_999); // noise
        assert_eq!(dec.edge(ZERO_TOTAL), Status::Nothing);
        // still not 32 bits in: a fresh header is required to resume.
    }
}
