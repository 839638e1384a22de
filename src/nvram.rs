//! Nonvolatile parameter store contract (§4.9): encode/decode/verify of the
//! persisted tunables subset. Pure codec; flash sector erase/write
//! sequencing and wear-leveling placement are owned by the caller (the
//! flash/QSPI register layer itself is out of scope, mirroring how the
//! reference app's `flash.rs` separates its register/instruction layer from
//! higher-level block management).

use crc::{Crc, CRC_32_ISO_HDLC};

use crate::config::{Tunables, VideoSource};
use crate::error::{PipelineError, Result};

const VALID: u8 = 0xFF;
const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Fixed field order, matching the original firmware's parameter table: the
/// block format is a contract other tools may parse, so field order must not
/// be reshuffled opportunistically.
///
/// img_wid, img_hig, factor_i, frame_width, delay, hue, brightness,
/// saturation, contrast (9 `u8`), crop_left, crop_width, crop_top,
/// crop_height (4 `u16`), leds_x, leds_y (2 `u8`), dyn_frames_limit (1
/// `u16`), video_source, agc_enabled (2 `u8`).
const FIELD_COUNT: usize = 18;
const PAYLOAD_LEN: usize = 9 * 1 + 4 * 2 + 2 * 1 + 1 * 2 + 2 * 1;
pub const BLOCK_LEN: usize = 1 + PAYLOAD_LEN + 4;

const _: () = assert!(FIELD_COUNT == 9 + 4 + 2 + 1 + 2, "FIELD_COUNT must match payload_bytes()'s field list");

fn payload_bytes(t: &Tunables) -> [u8; PAYLOAD_LEN] {
    let mut buf = [0u8; PAYLOAD_LEN];
    let mut i = 0;
    macro_rules! put_u8 {
        ($v:expr) => {{
            buf[i] = $v;
            i += 1;
        }};
    }
    macro_rules! put_u16 {
        ($v:expr) => {{
            let bytes = ($v as u16).to_le_bytes();
            buf[i] = bytes[0];
            buf[i + 1] = bytes[1];
            i += 2;
        }};
    }

    put_u8!(t.img_wid);
    put_u8!(t.img_hig);
    put_u8!(t.factor_i);
    put_u8!(t.frame_width);
    put_u8!(t.delay);
    put_u8!(t.hue);
    put_u8!(t.brightness);
    put_u8!(t.saturation);
    put_u8!(t.contrast);
    put_u16!(t.crop_left);
    put_u16!(t.crop_width);
    put_u16!(t.crop_top);
    put_u16!(t.crop_height);
    put_u8!(t.leds_x);
    put_u8!(t.leds_y);
    put_u16!(t.dyn_frames_limit);
    put_u8!(video_source_byte(t.video_source));
    put_u8!(t.agc_enabled as u8);

    buf
}

fn video_source_byte(src: VideoSource) -> u8 {
    match src {
        | VideoSource::Auto => 0,
        | VideoSource::Fixed1 => 1,
        | VideoSource::Fixed2 => 2,
    }
}

/// Encode the persisted subset of `tunables` as a validity-byte-prefixed,
/// CRC-suffixed block.
pub fn encode(tunables: &Tunables) -> [u8; BLOCK_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[0] = VALID;
    let payload = payload_bytes(tunables);
    block[1..1 + PAYLOAD_LEN].copy_from_slice(&payload);
    let crc = CRC.checksum(&block[..1 + PAYLOAD_LEN]);
    block[1 + PAYLOAD_LEN..].copy_from_slice(&crc.to_le_bytes());
    block
}

/// Decode and verify a block. A block failing either the validity byte or
/// the CRC check is treated as absent: the caller falls back to compiled-in
/// defaults rather than propagating a half-applied configuration.
pub fn decode(block: &[u8], base: Tunables) -> Result<Tunables> {
    if block.len() != BLOCK_LEN {
        return Err(PipelineError::NvramCorrupt);
    }
    if block[0] != VALID {
        return Err(PipelineError::NvramCorrupt);
    }

    let crc_stored = u32::from_le_bytes(block[1 + PAYLOAD_LEN..].try_into().unwrap());
    let crc_computed = CRC.checksum(&block[..1 + PAYLOAD_LEN]);
    if crc_stored != crc_computed {
        return Err(PipelineError::NvramCorrupt);
    }

    let payload = &block[1..1 + PAYLOAD_LEN];
    let mut i = 0;
    macro_rules! get_u8 {
        () => {{
            let v = payload[i];
            i += 1;
            v
        }};
    }
    macro_rules! get_u16 {
        () => {{
            let v = u16::from_le_bytes([payload[i], payload[i + 1]]);
            i += 2;
            v
        }};
    }

    let mut t = base;
    t.img_wid = get_u8!();
    t.img_hig = get_u8!();
    t.factor_i = get_u8!();
    t.frame_width = get_u8!();
    t.delay = get_u8!();
    t.hue = get_u8!();
    t.brightness = get_u8!();
    t.saturation = get_u8!();
    t.contrast = get_u8!();
    t.crop_left = get_u16!();
    t.crop_width = get_u16!();
    t.crop_top = get_u16!();
    t.crop_height = get_u16!();
    t.leds_x = get_u8!();
    t.leds_y = get_u8!();
    t.dyn_frames_limit = get_u16!();
    t.video_source = match get_u8!() {
        | 1 => VideoSource::Fixed1,
        | 2 => VideoSource::Fixed2,
        | _ => VideoSource::Auto,
    };
    t.agc_enabled = get_u8!() != 0;

    Ok(t)
}

/// Invalidate a block in place by overwriting its validity byte, the way old
/// blocks are superseded in a sector without erasing them immediately.
pub fn invalidate(block: &mut [u8]) {
    if let Some(validity) = block.first_mut() {
        *validity = 0x00;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trip_preserves_the_persisted_subset() {
        let mut t = Tunables::default();
        t.set_hue(7);
        t.set_leds_x(40);
        t.set_video_source(VideoSource::Fixed2);
        t.set_agc_enabled(false);

        let block = encode(&t);
        let decoded = decode(&block, Tunables::default()).unwrap();

        assert_eq!(decoded.hue, t.hue);
        assert_eq!(decoded.leds_x, t.leds_x);
        assert_eq!(decoded.video_source, t.video_source);
        assert_eq!(decoded.agc_enabled, t.agc_enabled);
    }

    #[test]
    fn a_corrupted_payload_byte_fails_the_crc_check() {
        let t = Tunables::default();
        let mut block = encode(&t);
        block[5] ^= 0xFF;
        assert_eq!(decode(&block, Tunables::default()), Err(PipelineError::NvramCorrupt));
    }

    #[test]
    fn an_invalidated_block_is_reported_absent() {
        let t = Tunables::default();
        let mut block = encode(&t);
        invalidate(&mut block);
        assert_eq!(decode(&block, Tunables::default()), Err(PipelineError::NvramCorrupt));
    }
}
