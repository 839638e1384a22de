//! Vertical sync handler (stage B): half-frame alternation, YCbCr->RGB
//! conversion at the field boundary, and frame-ready signaling.
//!
//! The frame-ready handoff is the one synchronization point between the
//! capture ISR and the foreground loop (see the concurrency model). It is
//! modeled the same way the reference app bridges its LTDC vsync interrupt
//! into an awaitable future: an [`embassy_sync::waitqueue::AtomicWaker`]
//! registered by the foreground, woken from interrupt context.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::waitqueue::AtomicWaker;

use crate::capture::Half;
use crate::colorspace::slot_to_rgb;
use crate::grid::{RgbGrid, SlotAccumGrid};

/// Frame-ready handoff between the vsync ISR and the foreground pipeline.
///
/// Raised only when the *left* half completes conversion, i.e. after both
/// halves have been captured within one left/right cycle - a single atomic
/// handoff per pair of field captures, matching the stage's contract.
pub struct FrameReady {
    ready: AtomicBool,
    waker: AtomicWaker,
}

impl FrameReady {
    pub const fn new() -> Self {
        Self { ready: AtomicBool::new(false), waker: AtomicWaker::new() }
    }

    /// Called from the vsync interrupt once the left half has converted.
    pub fn signal(&self) {
        self.ready.store(true, Ordering::Release);
        self.waker.wake();
    }

    /// Foreground-side poll: true and clears the flag if a frame is ready.
    pub fn take(&self) -> bool {
        self.ready.swap(false, Ordering::AcqRel)
    }

    pub async fn wait(&self) {
        core::future::poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.take() {
                core::task::Poll::Ready(())
            } else {
                core::task::Poll::Pending
            }
        })
        .await
    }
}

impl Default for FrameReady {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert every accumulated cell in `half`'s column range to RGB and clear
/// the accumulator, as the vsync handler does for the half that just
/// finished capturing.
pub fn convert_half(accum: &mut SlotAccumGrid, half: Half, rgb: &mut RgbGrid) {
    let cols = half.column_range();
    for row in 0..crate::consts::SLOTS_Y {
        for col in cols.clone() {
            let cell = accum.cell(row, col);
            rgb.set(row, col, slot_to_rgb(cell));
        }
    }
    accum.clear_half(cols);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grid::Rgb;

    #[test]
    fn convert_half_clears_the_converted_half_only() {
        let mut accum = SlotAccumGrid::new();
        accum.cell_mut(0, 0).accumulate(128, 128, 128, 128);
        accum.cell_mut(0, 40).accumulate(200, 200, 128, 128);
        let mut rgb = RgbGrid::new();

        convert_half(&mut accum, Half::Left, &mut rgb);

        assert_eq!(accum.cell(0, 0).count, 0);
        assert_eq!(accum.cell(0, 40).count, 1);
        assert_ne!(rgb.get(0, 0), Rgb::BLACK);
        assert_eq!(rgb.get(0, 40), Rgb::BLACK); // not yet converted
    }

    #[test]
    fn frame_ready_take_clears_the_flag() {
        let fr = FrameReady::new();
        assert!(!fr.take());
        fr.signal();
        assert!(fr.take());
        assert!(!fr.take());
    }
}
