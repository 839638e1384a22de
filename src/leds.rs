//! Geometric scaling to the physical LED count and the frame-delay ring
//! (stage E).

use heapless::Vec;

use crate::consts::{DELAY_LEN, LEDS_MAX};
use crate::grid::Rgb;
use crate::util::Bresenham;
use crate::virtual_image::{ImageCell, VirtualImage};

/// Project the virtual image's four runs onto `leds_x`/`leds_y` physical LEDs
/// per axis, averaging (no weights, no integrator - the smoother already ran
/// upstream in stage D) via the same Bresenham scaling rule.
pub fn project_to_leds(image: &VirtualImage, leds_x: usize, leds_y: usize) -> Vec<Rgb, LEDS_MAX> {
    let mut out = Vec::new();
    scale_run(image.right(), leds_y, &mut out);
    scale_run(image.top(), leds_x, &mut out);
    scale_run(image.left(), leds_y, &mut out);
    scale_run(image.bottom(), leds_x, &mut out);
    out
}

fn scale_run(src: &[ImageCell], dst_len: usize, out: &mut Vec<Rgb, LEDS_MAX>) {
    if dst_len == 0 || src.is_empty() {
        return;
    }
    let mut bresenham = Bresenham::new(src.len() as u32, dst_len as u32);
    let (mut sum_r, mut sum_g, mut sum_b, mut count) = (0i32, 0i32, 0i32, 0i32);
    let start_len = out.len();

    for cell in src {
        sum_r += cell.out.r as i32;
        sum_g += cell.out.g as i32;
        sum_b += cell.out.b as i32;
        count += 1;

        let emitted = bresenham.advance();
        if emitted > 0 {
            let avg = Rgb::new((sum_r / count) as u8, (sum_g / count) as u8, (sum_b / count) as u8);
            for _ in 0..emitted {
                let _ = out.push(avg);
            }
            sum_r = 0;
            sum_g = 0;
            sum_b = 0;
            count = 0;
        }
    }

    if count > 0 {
        let avg = Rgb::new((sum_r / count) as u8, (sum_g / count) as u8, (sum_b / count) as u8);
        while out.len() < start_len + dst_len {
            let _ = out.push(avg);
        }
    }
}

/// The `DELAY_LEN` x `LEDS_MAX` frame-delay ring.
///
/// Each frame, the new LED vector is written at the advancing write index;
/// the entry read back is `(write - delay) mod DELAY_LEN` slots behind it,
/// giving `delay + 1` frames of latency (delay = 0 is already one frame, as
/// the read always trails the write that just happened).
pub struct DelayRing {
    ring: [[Rgb; LEDS_MAX]; DELAY_LEN],
    write: usize,
}

impl DelayRing {
    pub const fn new() -> Self {
        Self { ring: [[Rgb::BLACK; LEDS_MAX]; DELAY_LEN], write: 0 }
    }

    /// Write `frame` at the current write index, advance it, and return the
    /// delayed frame that should be emitted this cycle.
    pub fn push_and_read(&mut self, frame: &[Rgb], delay: usize) -> [Rgb; LEDS_MAX] {
        let slot = &mut self.ring[self.write];
        slot.fill(Rgb::BLACK);
        slot[..frame.len()].copy_from_slice(frame);

        self.write = (self.write + 1) % DELAY_LEN;
        let read = (self.write + DELAY_LEN - 1 - delay.min(DELAY_LEN - 1)) % DELAY_LEN;
        self.ring[read]
    }
}

impl Default for DelayRing {
    fn default() -> Self {
        Self::new()
    }
}
