//! Transient overlay compositor (stage F).
//!
//! A per-LED overlay color and validity mask, visible for as long as a
//! countdown (driven by the 100 Hz system tick) remains positive. Used for
//! transient on-screen indicators such as a brightness bar rendered onto the
//! top edge.

use heapless::Vec;

use crate::consts::LEDS_MAX;
use crate::grid::Rgb;

pub struct Overlay {
    color: Vec<Option<Rgb>, LEDS_MAX>,
    ticks: u16,
}

impl Overlay {
    pub fn new(led_count: usize) -> Self {
        let mut color = Vec::new();
        for _ in 0..led_count {
            let _ = color.push(None);
        }
        Self { color, ticks: 0 }
    }

    /// Set an overlay color for one LED index and (re)arm the countdown.
    pub fn set(&mut self, index: usize, color: Rgb, hold_ticks: u16) {
        if let Some(slot) = self.color.get_mut(index) {
            *slot = Some(color);
        }
        self.ticks = self.ticks.max(hold_ticks);
    }

    /// Called at 100 Hz by the system tick; decrements the countdown and
    /// clears every overlay cell once it reaches zero.
    pub fn tick(&mut self) {
        if self.ticks > 0 {
            self.ticks -= 1;
            if self.ticks == 0 {
                for slot in self.color.iter_mut() {
                    *slot = None;
                }
            }
        }
    }

    pub fn active(&self) -> bool {
        self.ticks > 0
    }

    /// Composite the overlay over `output`, in place: `output[i]` is replaced
    /// wherever the overlay at `i` is both valid and still counting down.
    pub fn composite(&self, output: &mut [Rgb]) {
        if !self.active() {
            return;
        }
        for (i, out) in output.iter_mut().enumerate() {
            if let Some(Some(overlay)) = self.color.get(i) {
                *out = *overlay;
            }
        }
    }

    /// Illuminate a `width`-LED neighborhood centered on `center` with a
    /// proportional bar representing `percent` (0..=100), as used for the
    /// top-edge brightness/value indicator.
    pub fn show_bar(&mut self, center: usize, width: usize, percent: u8, hold_ticks: u16) {
        let percent = percent.min(100) as u32;
        let lit = (width as u32 * percent / 100) as usize;
        let half = width / 2;
        for offset in 0..width {
            let idx = center + offset;
            if idx < half {
                continue;
            }
            let idx = idx - half;
            let color = if offset < lit { Rgb::new(0, 200, 0) } else { Rgb::new(20, 20, 20) };
            self.set(idx, color, hold_ticks);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn overlay_wins_over_pipeline_output_while_active() {
        let mut overlay = Overlay::new(4);
        overlay.set(1, Rgb::new(9, 9, 9), 3);
        let mut output = [Rgb::BLACK; 4];
        overlay.composite(&mut output);
        assert_eq!(output[1], Rgb::new(9, 9, 9));
        assert_eq!(output[0], Rgb::BLACK);
    }

    #[test]
    fn overlay_expires_after_its_hold_ticks() {
        let mut overlay = Overlay::new(2);
        overlay.set(0, Rgb::new(1, 2, 3), 2);
        overlay.tick();
        assert!(overlay.active());
        overlay.tick();
        assert!(!overlay.active());
        let mut output = [Rgb::new(5, 5, 5); 2];
        overlay.composite(&mut output);
        assert_eq!(output[0], Rgb::new(5, 5, 5));
    }
}
