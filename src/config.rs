//! Process-wide configuration aggregate.
//!
//! `Tunables` owns every mutable parameter the console (`console`), the IR
//! bridge, and the nonvolatile store (`nvram`) can change. Every setter clamps
//! to the parameter's declared range and returns the post-clamp value, which is
//! what both collaborators report back to the operator. `generation` is bumped
//! on every change so the foreground loop can detect the one-frame skew the
//! concurrency model tolerates between a console/IR edit and its pipeline effect.

use crate::consts::{DYN_FRAMES_LIMIT_MAX, FRAME_WIDTH_MAX, LEDS_X_MAX, LEDS_Y_MAX, SLOTS_X, SLOTS_Y};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum VideoSource {
    Auto,
    Fixed1,
    Fixed2,
}

impl VideoSource {
    pub const fn from_digit(d: u8) -> Option<Self> {
        match d {
            | 0 => Some(Self::Auto),
            | 1 => Some(Self::Fixed1),
            | 2 => Some(Self::Fixed2),
            | _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct Tunables {
    pub brightness: u8,
    pub saturation: u8,
    pub hue: u8,
    pub contrast: u8,
    pub video_source: VideoSource,
    pub agc_enabled: bool,

    pub crop_left: u16,
    pub crop_top: u16,
    pub crop_width: u16,
    pub crop_height: u16,

    pub img_wid: u8,
    pub img_hig: u8,
    pub leds_x: u8,
    pub leds_y: u8,

    pub frame_width: u8,
    pub factor_i: u8,
    pub delay: u8,
    pub dyn_frames_limit: u16,

    /// Bumped by every setter. The foreground loop snapshots this once per
    /// frame to tell whether a console/IR edit landed mid-frame.
    pub generation: u32,
}

impl Tunables {
    pub const DEFAULT: Self = Self {
        brightness: 128,
        saturation: 128,
        hue: 128,
        contrast: 128,
        video_source: VideoSource::Auto,
        agc_enabled: true,

        crop_left: 0,
        crop_top: 0,
        crop_width: 720,
        crop_height: 576,

        img_wid: 32,
        img_hig: 20,
        leds_x: 32,
        leds_y: 20,

        frame_width: 4,
        factor_i: 32,
        delay: 0,
        dyn_frames_limit: 100,

        generation: 0,
    };

    pub const fn leds_physical(&self) -> u16 {
        2 * (self.leds_x as u16 + self.leds_y as u16)
    }

    pub const fn virtual_len(&self) -> u16 {
        2 * (self.img_wid as u16 + self.img_hig as u16)
    }

    pub fn set_brightness(&mut self, v: i16) -> u8 {
        self.brightness = clamp_u8(v);
        self.bump();
        self.brightness
    }

    pub fn set_saturation(&mut self, v: i16) -> u8 {
        self.saturation = clamp_u8(v);
        self.bump();
        self.saturation
    }

    pub fn set_hue(&mut self, v: i16) -> u8 {
        self.hue = clamp_u8(v);
        self.bump();
        self.hue
    }

    pub fn set_contrast(&mut self, v: i16) -> u8 {
        self.contrast = clamp_u8(v);
        self.bump();
        self.contrast
    }

    pub fn set_crop_left(&mut self, v: i32) -> u16 {
        self.crop_left = clamp_u16(v, 0, SLOTS_X as i32 * 20);
        self.bump();
        self.crop_left
    }

    pub fn set_crop_top(&mut self, v: i32) -> u16 {
        self.crop_top = clamp_u16(v, 0, SLOTS_Y as i32 * 20);
        self.bump();
        self.crop_top
    }

    pub fn set_crop_width(&mut self, v: i32) -> u16 {
        self.crop_width = clamp_u16(v, 1, SLOTS_X as i32 * 20);
        self.bump();
        self.crop_width
    }

    pub fn set_crop_height(&mut self, v: i32) -> u16 {
        self.crop_height = clamp_u16(v, 1, SLOTS_Y as i32 * 20);
        self.bump();
        self.crop_height
    }

    pub fn set_img_wid(&mut self, v: i16) -> u8 {
        self.img_wid = clamp_u8_range(v, 1, SLOTS_X as i16);
        self.bump();
        self.img_wid
    }

    pub fn set_img_hig(&mut self, v: i16) -> u8 {
        self.img_hig = clamp_u8_range(v, 1, SLOTS_Y as i16);
        self.bump();
        self.img_hig
    }

    pub fn set_leds_x(&mut self, v: i16) -> u8 {
        self.leds_x = clamp_u8_range(v, 1, LEDS_X_MAX as i16);
        self.bump();
        self.leds_x
    }

    pub fn set_leds_y(&mut self, v: i16) -> u8 {
        self.leds_y = clamp_u8_range(v, 1, LEDS_Y_MAX as i16);
        self.bump();
        self.leds_y
    }

    pub fn set_frame_width(&mut self, v: i16) -> u8 {
        self.frame_width = clamp_u8_range(v, 1, FRAME_WIDTH_MAX as i16);
        self.bump();
        self.frame_width
    }

    pub fn set_factor_i(&mut self, v: i16) -> u8 {
        self.factor_i = clamp_u8_range(v, 1, 128);
        self.bump();
        self.factor_i
    }

    pub fn set_delay(&mut self, v: i16) -> u8 {
        self.delay = clamp_u8_range(v, 0, crate::consts::DELAY_LEN as i16 - 1);
        self.bump();
        self.delay
    }

    pub fn set_dyn_frames_limit(&mut self, v: i32) -> u16 {
        self.dyn_frames_limit = clamp_u16(v, 0, DYN_FRAMES_LIMIT_MAX as i32);
        self.bump();
        self.dyn_frames_limit
    }

    pub fn set_video_source(&mut self, src: VideoSource) {
        self.video_source = src;
        self.bump();
    }

    pub fn set_agc_enabled(&mut self, enabled: bool) {
        self.agc_enabled = enabled;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn clamp_u8(v: i16) -> u8 {
    v.clamp(0, u8::MAX as i16) as u8
}

fn clamp_u8_range(v: i16, lo: i16, hi: i16) -> u8 {
    v.clamp(lo, hi) as u8
}

fn clamp_u16(v: i32, lo: i32, hi: i32) -> u16 {
    v.clamp(lo, hi) as u16
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::below(-1, 1)]
    #[case::at_min(1, 1)]
    #[case::inside(64, 64)]
    #[case::at_max(11, 11)]
    #[case::above(99, 11)]
    fn set_frame_width_clamps(#[case] input: i16, #[case] expect: u8) {
        let mut t = Tunables::default();
        assert_eq!(t.set_frame_width(input), expect);
    }

    #[test]
    fn default_round_trips_through_a_setter_reset() {
        let mut t = Tunables::default();
        t.set_brightness(10);
        assert_ne!(t.brightness, Tunables::DEFAULT.brightness);
        t.brightness = Tunables::DEFAULT.brightness;
        t.generation = Tunables::DEFAULT.generation;
        assert_eq!(t, Tunables::DEFAULT);
    }

    #[test]
    fn leds_physical_is_perimeter_of_leds_x_y() {
        let mut t = Tunables::default();
        t.set_leds_x(10);
        t.set_leds_y(5);
        assert_eq!(t.leds_physical(), 30);
    }

    #[test]
    fn every_setter_bumps_the_generation_counter() {
        let mut t = Tunables::default();
        let before = t.generation;
        t.set_hue(200);
        assert_eq!(t.generation, before.wrapping_add(1));
        t.set_agc_enabled(false);
        assert_eq!(t.generation, before.wrapping_add(2));
    }
}
