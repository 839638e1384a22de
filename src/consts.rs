//! Fixed compile-time bounds shared across the pipeline.

/// Coarse grid resolution, horizontal.
pub const SLOTS_X: usize = 64;
/// Coarse grid resolution, vertical.
pub const SLOTS_Y: usize = 40;

/// Upper bound on the physical LED strip width.
pub const LEDS_X_MAX: usize = 96;
/// Upper bound on the physical LED strip height.
pub const LEDS_Y_MAX: usize = 60;
/// Upper bound on the total physical LED count (perimeter of `LEDS_X_MAX` x `LEDS_Y_MAX`).
pub const LEDS_MAX: usize = 2 * (LEDS_X_MAX + LEDS_Y_MAX);

/// Maximum frame delay carried by the delay ring.
pub const DELAY_LEN: usize = 20;

/// Maximum letterbox inset searched from each edge.
pub const DYN_WIN: usize = 10;

/// Hysteresis above the dynamic black floor used by the letterbox edge search.
pub const BLACK_SHIFT: i32 = 10;

/// Divisor applied to the integral controller's accumulator to obtain an output byte.
pub const MAX_ICONTROL: i32 = 128;

/// Upper bound on `Tunables::dyn_frames_limit`.
pub const DYN_FRAMES_LIMIT_MAX: u16 = 200;

/// Upper bound on `Tunables::frame_width`.
pub const FRAME_WIDTH_MAX: u8 = 11;
