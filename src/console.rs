//! Console contract (§4.10): single-character command grammar selecting a
//! tunable by mnemonic, then adjusting it with `+`/`-`/`d` keystrokes.
//!
//! Parsing follows the reference app's byte-streaming `cli.rs`: each
//! keystroke is recognized with a `nom` combinator rather than hand-rolled
//! byte indexing, even though the grammar here is a single byte at a time
//! rather than `cli.rs`'s whitespace/quote-delimited argument stream.

use nom::character::complete::one_of;
use nom::IResult;

use crate::config::{Tunables, VideoSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Hue,
    Saturation,
    Brightness,
    Contrast,
    CropLeft,
    CropWidth,
    CropTop,
    CropHeight,
    IntegralFactor,
    ImgWid,
    ImgHig,
    LedsX,
    LedsY,
    FrameWidth,
    Delay,
    Agc,
    DynFramesLimit,
    VideoSource,
    Diagnostics,
}

const MNEMONICS: &str = "FSBCLWTHIXYPREMAGVQ";

fn parse_mnemonic(input: &[u8]) -> IResult<&[u8], char> {
    one_of(MNEMONICS)(input)
}

fn mnemonic_from_char(c: char) -> Option<Mnemonic> {
    use Mnemonic::*;
    Some(match c {
        | 'F' => Hue,
        | 'S' => Saturation,
        | 'B' => Brightness,
        | 'C' => Contrast,
        | 'L' => CropLeft,
        | 'W' => CropWidth,
        | 'T' => CropTop,
        | 'H' => CropHeight,
        | 'I' => IntegralFactor,
        | 'X' => ImgWid,
        | 'Y' => ImgHig,
        | 'P' => LedsX,
        | 'R' => LedsY,
        | 'E' => FrameWidth,
        | 'M' => Delay,
        | 'A' => Agc,
        | 'G' => DynFramesLimit,
        | 'V' => VideoSource,
        | 'Q' => Diagnostics,
        | _ => return None,
    })
}

/// The console's single piece of session state: which mnemonic was last
/// selected, interpreting subsequent `+`/`-`/`d` keystrokes against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleSession {
    selected: Option<Mnemonic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// A mnemonic was selected; report its current value.
    Selected(Mnemonic, i32),
    /// An adjustment was applied; report the post-clamp value.
    Adjusted(Mnemonic, i32),
    /// `Q` was pressed: print diagnostics (the caller formats from `Tunables`).
    Diagnostics,
    /// Unrecognized input: the current selection is left unchanged.
    Usage,
}

impl ConsoleSession {
    pub fn handle(&mut self, tunables: &mut Tunables, byte: u8) -> Response {
        let c = byte as char;

        if let Ok((_, mnemonic_char)) = parse_mnemonic(&[byte]) {
            let Some(mnemonic) = mnemonic_from_char(mnemonic_char) else {
                return Response::Usage;
            };
            if matches!(mnemonic, Mnemonic::Diagnostics) {
                self.selected = None;
                return Response::Diagnostics;
            }
            self.selected = Some(mnemonic);
            return Response::Selected(mnemonic, current_value(tunables, mnemonic));
        }

        match (c, self.selected) {
            | ('+', Some(m)) => Response::Adjusted(m, adjust(tunables, m, 1)),
            | ('-', Some(m)) => Response::Adjusted(m, adjust(tunables, m, -1)),
            | ('d', Some(m)) => Response::Adjusted(m, reset_default(tunables, m)),
            | ('0' | '1' | '2', Some(Mnemonic::VideoSource)) => {
                let digit = byte - b'0';
                tunables.set_video_source(VideoSource::from_digit(digit).unwrap_or(VideoSource::Auto));
                Response::Adjusted(
                    Mnemonic::VideoSource,
                    crate::decoder::video_source_select_value(tunables.video_source) as i32,
                )
            }
            | _ => Response::Usage,
        }
    }
}

fn current_value(t: &Tunables, m: Mnemonic) -> i32 {
    use Mnemonic::*;
    match m {
        | Hue => t.hue as i32,
        | Saturation => t.saturation as i32,
        | Brightness => t.brightness as i32,
        | Contrast => t.contrast as i32,
        | CropLeft => t.crop_left as i32,
        | CropWidth => t.crop_width as i32,
        | CropTop => t.crop_top as i32,
        | CropHeight => t.crop_height as i32,
        | IntegralFactor => t.factor_i as i32,
        | ImgWid => t.img_wid as i32,
        | ImgHig => t.img_hig as i32,
        | LedsX => t.leds_x as i32,
        | LedsY => t.leds_y as i32,
        | FrameWidth => t.frame_width as i32,
        | Delay => t.delay as i32,
        | Agc => t.agc_enabled as i32,
        | DynFramesLimit => t.dyn_frames_limit as i32,
        | VideoSource => crate::decoder::video_source_select_value(t.video_source) as i32,
        | Diagnostics => 0,
    }
}

fn adjust(t: &mut Tunables, m: Mnemonic, delta: i16) -> i32 {
    use Mnemonic::*;
    (match m {
        | Hue => t.set_hue(t.hue as i16 + delta) as i32,
        | Saturation => t.set_saturation(t.saturation as i16 + delta) as i32,
        | Brightness => t.set_brightness(t.brightness as i16 + delta) as i32,
        | Contrast => t.set_contrast(t.contrast as i16 + delta) as i32,
        | CropLeft => t.set_crop_left(t.crop_left as i32 + delta as i32) as i32,
        | CropWidth => t.set_crop_width(t.crop_width as i32 + delta as i32) as i32,
        | CropTop => t.set_crop_top(t.crop_top as i32 + delta as i32) as i32,
        | CropHeight => t.set_crop_height(t.crop_height as i32 + delta as i32) as i32,
        | IntegralFactor => t.set_factor_i(t.factor_i as i16 + delta) as i32,
        | ImgWid => t.set_img_wid(t.img_wid as i16 + delta) as i32,
        | ImgHig => t.set_img_hig(t.img_hig as i16 + delta) as i32,
        | LedsX => t.set_leds_x(t.leds_x as i16 + delta) as i32,
        | LedsY => t.set_leds_y(t.leds_y as i16 + delta) as i32,
        | FrameWidth => t.set_frame_width(t.frame_width as i16 + delta) as i32,
        | Delay => t.set_delay(t.delay as i16 + delta) as i32,
        | Agc => {
            t.set_agc_enabled(delta > 0);
            t.agc_enabled as i32
        }
        | DynFramesLimit => t.set_dyn_frames_limit(t.dyn_frames_limit as i32 + delta as i32) as i32,
        | VideoSource => {
            let next = (crate::decoder::video_source_select_value(t.video_source) as i16 + delta)
                .rem_euclid(3);
            t.set_video_source(VideoSource::from_digit(next as u8).unwrap_or(VideoSource::Auto));
            crate::decoder::video_source_select_value(t.video_source) as i32
        }
        | Diagnostics => 0,
    }) as i32
}

fn reset_default(t: &mut Tunables, m: Mnemonic) -> i32 {
    use Mnemonic::*;
    let d = Tunables::DEFAULT;
    match m {
        | Hue => t.hue = d.hue,
        | Saturation => t.saturation = d.saturation,
        | Brightness => t.brightness = d.brightness,
        | Contrast => t.contrast = d.contrast,
        | CropLeft => t.crop_left = d.crop_left,
        | CropWidth => t.crop_width = d.crop_width,
        | CropTop => t.crop_top = d.crop_top,
        | CropHeight => t.crop_height = d.crop_height,
        | IntegralFactor => t.factor_i = d.factor_i,
        | ImgWid => t.img_wid = d.img_wid,
        | ImgHig => t.img_hig = d.img_hig,
        | LedsX => t.leds_x = d.leds_x,
        | LedsY => t.leds_y = d.leds_y,
        | FrameWidth => t.frame_width = d.frame_width,
        | Delay => t.delay = d.delay,
        | Agc => t.agc_enabled = d.agc_enabled,
        | DynFramesLimit => t.dyn_frames_limit = d.dyn_frames_limit,
        | VideoSource => t.video_source = d.video_source,
        | Diagnostics => {}
    }
    current_value(t, m)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unknown_byte_reports_usage_and_keeps_selection() {
        let mut session = ConsoleSession::default();
        let mut t = Tunables::default();
        session.handle(&mut t, b'F');
        assert_eq!(session.handle(&mut t, b'?'), Response::Usage);
        assert_eq!(session.selected, Some(Mnemonic::Hue));
    }

    #[test]
    fn select_then_default_restores_compiled_in_default() {
        let mut session = ConsoleSession::default();
        let mut t = Tunables::default();
        t.set_hue(7);
        session.handle(&mut t, b'F');
        session.handle(&mut t, b'd');
        assert_eq!(t.hue, Tunables::DEFAULT.hue);
    }

    #[test]
    fn digit_after_v_selects_the_video_source_directly() {
        let mut session = ConsoleSession::default();
        let mut t = Tunables::default();
        session.handle(&mut t, b'V');
        session.handle(&mut t, b'2');
        assert_eq!(t.video_source, VideoSource::Fixed2);
        session.handle(&mut t, b'0');
        assert_eq!(t.video_source, VideoSource::Auto);
    }

    #[test]
    fn a_digit_without_v_selected_is_usage() {
        let mut session = ConsoleSession::default();
        let mut t = Tunables::default();
        session.handle(&mut t, b'F');
        assert_eq!(session.handle(&mut t, b'1'), Response::Usage);
    }

    #[test]
    fn plus_minus_never_escape_the_declared_range() {
        let mut session = ConsoleSession::default();
        let mut t = Tunables::default();
        session.handle(&mut t, b'E'); // frame width
        for _ in 0..50 {
            session.handle(&mut t, b'+');
        }
        assert!(t.frame_width <= crate::consts::FRAME_WIDTH_MAX);
        for _ in 0..50 {
            session.handle(&mut t, b'-');
        }
        assert!(t.frame_width >= 1);
    }
}
