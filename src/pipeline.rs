//! The owning pipeline aggregate: wires stages A through F together in the
//! fixed order the concurrency model requires, and threads the shared state
//! each context is allowed to touch.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::capture::{Cursors, Half, PixelTuple};
use crate::config::Tunables;
use crate::consts::LEDS_MAX;
use crate::grid::{Rgb, RgbGrid, SlotAccumGrid};
use crate::leds::{project_to_leds, DelayRing};
use crate::letterbox::LetterboxDetector;
use crate::overlay::Overlay;
use crate::virtual_image::VirtualImage;
use crate::vsync::{convert_half, FrameReady};

/// Set by the foreground after handing a buffer to the LED serializer,
/// cleared by the serializer's DMA-complete interrupt. The foreground must
/// observe this false before overwriting the LED output buffer again.
pub struct LedBusy(AtomicBool);

impl LedBusy {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn mark_busy(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn mark_idle(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for LedBusy {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Pipeline {
    pub tunables: Tunables,

    accum: SlotAccumGrid,
    rgb: RgbGrid,
    letterbox: LetterboxDetector,
    virtual_image: VirtualImage,
    delay_ring: DelayRing,
    pub overlay: Overlay,

    cursors: Cursors,
    capturing: Half,

    pub frame_ready: FrameReady,
    pub led_busy: LedBusy,

    /// Monotonic count of `on_line` calls that hit a capture fault (§7
    /// `PipelineError::CaptureFault`). Never reset; a diagnostics surface
    /// reads it, it doesn't gate anything.
    capture_faults: u32,

    /// `tunables.generation` as of the last `run_foreground` call, so the
    /// next call can tell whether a console/IR edit landed mid-frame.
    last_tunables_generation: u32,
    /// Whether the most recent `run_foreground` observed `tunables.generation`
    /// having moved since the previous frame.
    pub tunables_skewed_last_frame: bool,
}

impl Pipeline {
    pub fn new(tunables: Tunables) -> Self {
        let cursors = Cursors::new(tunables.crop_width as u32, tunables.crop_height as u32, Half::Left);
        let last_tunables_generation = tunables.generation;
        Self {
            tunables,
            accum: SlotAccumGrid::new(),
            rgb: RgbGrid::new(),
            letterbox: LetterboxDetector::new(),
            virtual_image: VirtualImage::new(),
            delay_ring: DelayRing::new(),
            overlay: Overlay::new(LEDS_MAX),
            cursors,
            capturing: Half::Left,
            frame_ready: FrameReady::new(),
            led_busy: LedBusy::new(),
            capture_faults: 0,
            last_tunables_generation,
            tunables_skewed_last_frame: false,
        }
    }

    /// Stage A, called from the line-DMA-complete interrupt for one captured
    /// line of the half currently being captured.
    pub fn on_line(&mut self, line: &[PixelTuple]) {
        if self.cursors.ingest_line(line, &mut self.accum).is_err() {
            // Transient capture fault: the accumulator for this half stays
            // as-is and capture continues at the next line.
            self.capture_faults = self.capture_faults.wrapping_add(1);
            #[cfg(feature = "log")]
            defmt::warn!("capture fault on line ingest, total so far: {}", self.capture_faults);
        }
    }

    /// Monotonic count of capture faults observed since construction (§7).
    pub fn capture_fault_count(&self) -> u32 {
        self.capture_faults
    }

    /// Stage B, called from the vertical-sync interrupt. Converts the half
    /// that just finished capturing, flips which half is captured next, and
    /// raises `frame_ready` only when the left half has just converted.
    pub fn on_vsync(&mut self) {
        let completed = self.capturing;
        convert_half(&mut self.accum, completed, &mut self.rgb);
        self.cursors = Cursors::new(
            self.tunables.crop_width as u32,
            self.tunables.crop_height as u32,
            completed.flipped(),
        );
        self.capturing = completed.flipped();

        if matches!(completed, Half::Left) {
            self.frame_ready.signal();
        }
    }

    /// Stages C through F, run from the foreground loop once per
    /// `frame_ready` observation. Returns the LED output buffer (after
    /// overlay compositing) ready to hand to the LED serializer.
    pub fn run_foreground(&mut self) -> heapless::Vec<Rgb, LEDS_MAX> {
        self.tunables_skewed_last_frame = self.tunables.generation != self.last_tunables_generation;
        self.last_tunables_generation = self.tunables.generation;
        #[cfg(feature = "log")]
        if self.tunables_skewed_last_frame {
            defmt::debug!("tunables changed since the previous frame (generation {})", self.last_tunables_generation);
        }

        self.letterbox.update(&self.rgb, self.tunables.dyn_frames_limit);

        self.virtual_image.update(
            &self.rgb,
            &self.letterbox.rect,
            self.tunables.img_wid as usize,
            self.tunables.img_hig as usize,
            self.tunables.frame_width,
            self.tunables.factor_i as i32,
        );

        let scaled = project_to_leds(
            &self.virtual_image,
            self.tunables.leds_x as usize,
            self.tunables.leds_y as usize,
        );
        let delayed = self.delay_ring.push_and_read(&scaled, self.tunables.delay as usize);

        let mut out: heapless::Vec<Rgb, LEDS_MAX> = heapless::Vec::new();
        let leds_physical = self.tunables.leds_physical() as usize;
        for pixel in delayed.into_iter().take(leds_physical) {
            let _ = out.push(pixel);
        }
        self.overlay.composite(&mut out);
        out
    }

    pub fn letterbox_rect(&self) -> crate::letterbox::LetterboxRect {
        self.letterbox.rect
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn solid_line(len: usize, cb: u8, y: u8, cr: u8) -> heapless::Vec<PixelTuple, 1024> {
        let mut v = heapless::Vec::new();
        for _ in 0..len {
            let _ = v.push(PixelTuple { cb, y0: y, cr, y1: y });
        }
        v
    }

    #[test]
    fn a_line_ingest_fault_is_counted_and_does_not_stop_capture() {
        let tunables = Tunables::default();
        let mut pipeline = Pipeline::new(tunables);
        let line = solid_line(tunables.crop_width as usize, 128, 128, 128);

        // Feed far more lines than `crop_height` distributes across slot
        // rows, driving the row cursor past `SLOTS_Y` and into the fault path.
        for _ in 0..2000 {
            pipeline.on_line(&line);
        }

        assert!(pipeline.capture_fault_count() > 0);
        // Still responsive afterwards: on_vsync doesn't panic or wedge.
        pipeline.on_vsync();
    }

    #[test]
    fn run_foreground_flags_a_tunables_change_since_the_previous_frame() {
        let mut pipeline = Pipeline::new(Tunables::default());
        let _ = pipeline.run_foreground();
        assert!(!pipeline.tunables_skewed_last_frame);

        pipeline.tunables.set_brightness(200);
        let _ = pipeline.run_foreground();
        assert!(pipeline.tunables_skewed_last_frame);

        let _ = pipeline.run_foreground();
        assert!(!pipeline.tunables_skewed_last_frame);
    }

    #[test]
    fn end_to_end_steady_gray_settles_to_mid_gray_leds() {
        let mut tunables = Tunables::default();
        tunables.dyn_frames_limit = 0; // disable letterbox search for this scenario
        tunables.factor_i = 128;
        tunables.delay = 0;
        let mut pipeline = Pipeline::new(tunables);

        let line = solid_line(tunables.crop_width as usize, 128, 128, 128);
        // Feed enough left-half and right-half lines/vsyncs to converge.
        for _ in 0..4 {
            for half in [Half::Left, Half::Right] {
                for _ in 0..(tunables.crop_height as usize / 2) {
                    pipeline.on_line(&line);
                }
                pipeline.on_vsync();
                let _ = half;
            }
            if pipeline.frame_ready.take() {
                let leds = pipeline.run_foreground();
                for led in leds {
                    assert!((led.r as i32 - 128).abs() <= 2);
                    assert!((led.g as i32 - 128).abs() <= 2);
                    assert!((led.b as i32 - 128).abs() <= 2);
                }
            }
        }
    }
}
