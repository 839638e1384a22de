//! BT.601 YCbCr -> RGB conversion of one averaged slot accumulator.
//!
//! The 1000-denominator integer coefficients are part of the contract: they
//! must stay bit-exact, not merely "close enough", since the letterbox detector
//! and edge sampler downstream assume deterministic slot colors.

use crate::grid::{Rgb, SlotAccum};

const CR_TO_R: i32 = 1403;
const CR_TO_G: i32 = 714;
const CB_TO_G: i32 = 344;
const CB_TO_B: i32 = 1773;
const COEFF_DENOM: i32 = 1000;

/// Convert one slot's averaged YCbCr sums to RGB.
///
/// A slot with `count == 0` (never touched this half, e.g. the crop window
/// shrank) converts to black rather than dividing by zero.
pub fn slot_to_rgb(accum: &SlotAccum) -> Rgb {
    let count = accum.count as i32;
    if count == 0 {
        return Rgb::BLACK;
    }

    let y = accum.sum_y / (2 * count);
    let cb = accum.sum_cb / count;
    let cr = accum.sum_cr / count;

    let r = y + (CR_TO_R * cr) / COEFF_DENOM;
    let g = y - (CR_TO_G * cr + CB_TO_G * cb) / COEFF_DENOM;
    let b = y + (CB_TO_B * cb) / COEFF_DENOM;

    Rgb::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
}

fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 254) as u8
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn accum(sum_y: i32, sum_cb: i32, sum_cr: i32, count: u16) -> SlotAccum {
        SlotAccum { sum_y, sum_cb, sum_cr, count }
    }

    #[test]
    fn untouched_slot_converts_to_black() {
        let a = SlotAccum::new();
        assert_eq!(slot_to_rgb(&a), Rgb::BLACK);
    }

    #[test]
    fn uniform_mid_gray_round_trips() {
        // Y=128, Cb=Cr=128 (de-biased to 0) across 4 samples in one slot.
        let mut a = SlotAccum::new();
        for _ in 0..4 {
            a.accumulate(128, 128, 128, 128);
        }
        let rgb = slot_to_rgb(&a);
        assert_eq!(rgb, Rgb::new(128, 128, 128));
    }

    #[rstest]
    #[case::pure_black(0, 0, 0, 1, Rgb::new(0, 0, 0))]
    fn edge_cases(
        #[case] sum_y: i32,
        #[case] sum_cb: i32,
        #[case] sum_cr: i32,
        #[case] count: u16,
        #[case] expect: Rgb,
    ) {
        assert_eq!(slot_to_rgb(&accum(sum_y, sum_cb, sum_cr, count)), expect);
    }
}
