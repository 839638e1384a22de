//! LED wire-protocol contract (§4.8): WS2812 single-wire NRZ encoding.
//!
//! The real peripheral drives this over a timer-PWM + DMA pair (one compare
//! value per bit); programming that timer/DMA sequence is out of scope here,
//! the way the reference app's bit-banged SPI/QuadSPI drivers in `bitbang.rs`
//! separate "what bits go out" from "how the pins are toggled". This module
//! owns the former: turning an RGB buffer into the wire's bit pattern and the
//! buffer handoff/`busy` contract the foreground observes.

use crate::grid::Rgb;

/// PWM compare value (in timer ticks) encoding a logical one bit.
pub const ONE_TICKS: u16 = 30;
/// PWM compare value (in timer ticks) encoding a logical zero bit.
pub const ZERO_TICKS: u16 = 15;
/// Idle bit-times appended after the last LED to latch the strip (reset gap).
pub const RESET_GAP_BITS: usize = 50;

const BITS_PER_LED: usize = 24;

/// Serialize one LED's color into 24 wire bits, G-R-B byte order, MSB first -
/// the order and starting corner match the bottom-right-first run layout
/// used by the virtual image and physical LED projection.
pub fn encode_led(color: Rgb, out: &mut [u16; BITS_PER_LED]) {
    let bytes = [color.g, color.r, color.b];
    let mut i = 0;
    for byte in bytes {
        for bit in (0..8).rev() {
            out[i] = if byte & (1 << bit) != 0 { ONE_TICKS } else { ZERO_TICKS };
            i += 1;
        }
    }
}

/// Serialize `leds` into `out` as a flat stream of per-bit PWM compare
/// values, followed by [`RESET_GAP_BITS`] zero-duty entries. `out` must be at
/// least `leds.len() * 24 + RESET_GAP_BITS` long; returns the number of
/// entries written.
pub fn encode(leds: &[Rgb], out: &mut [u16]) -> usize {
    let mut cursor = 0;
    let mut bits = [0u16; BITS_PER_LED];
    for &led in leds {
        encode_led(led, &mut bits);
        let end = (cursor + BITS_PER_LED).min(out.len());
        let n = end - cursor;
        out[cursor..end].copy_from_slice(&bits[..n]);
        cursor = end;
        if cursor >= out.len() {
            return cursor;
        }
    }
    let gap_end = (cursor + RESET_GAP_BITS).min(out.len());
    out[cursor..gap_end].fill(0);
    gap_end
}

// The busy-flag contract the foreground must observe before handing over a
// new buffer is `pipeline::LedBusy`; the serializer itself only turns an RGB
// buffer into wire bits.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn encode_led_emits_grb_byte_order_msb_first() {
        let mut bits = [0u16; BITS_PER_LED];
        encode_led(Rgb::new(0b1000_0000, 0b0000_0001, 0), &mut bits);
        // G byte (0x01) comes first: seven zero bits then a one bit.
        assert_eq!(&bits[0..7], &[ZERO_TICKS; 7]);
        assert_eq!(bits[7], ONE_TICKS);
        // R byte (0x80) next: one bit then seven zero bits.
        assert_eq!(bits[8], ONE_TICKS);
        assert_eq!(&bits[9..16], &[ZERO_TICKS; 7]);
        // B byte (0x00) last: all zero bits.
        assert_eq!(&bits[16..24], &[ZERO_TICKS; 8]);
    }

    #[test]
    fn encode_appends_a_reset_gap_of_zero_duty_entries() {
        let leds = [Rgb::new(1, 2, 3)];
        let mut out = [0xFFFFu16; BITS_PER_LED + RESET_GAP_BITS];
        let written = encode(&leds, &mut out);
        assert_eq!(written, BITS_PER_LED + RESET_GAP_BITS);
        assert!(out[BITS_PER_LED..].iter().all(|&t| t == 0));
    }
}
