//! Edge extractor & temporal smoother (stage D): weighted inward sampling
//! from each of the four letterbox edges, Bresenham scaling to the virtual
//! edge length, and per-channel integral control.

use heapless::Vec;

use crate::consts::{MAX_ICONTROL, SLOTS_X, SLOTS_Y};
use crate::grid::{Rgb, RgbGrid};
use crate::letterbox::LetterboxRect;
use crate::util::{clamp_i32, Bresenham};

const MAX_RUN: usize = if SLOTS_X > SLOTS_Y { SLOTS_X } else { SLOTS_Y };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Right,
    Top,
    Left,
    Bottom,
}

/// One virtual-image cell: the smoothed output color plus the per-channel
/// integrator state driving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageCell {
    pub out: Rgb,
    ri: i32,
    gi: i32,
    bi: i32,
}

impl ImageCell {
    const fn new() -> Self {
        Self { out: Rgb::BLACK, ri: 0, gi: 0, bi: 0 }
    }

    /// Integral-only controller: `err = (target - out) * factor_i; I += err;
    /// out = clamp(I / MAX_ICONTROL, 0, 255)`. A pure integrator settles
    /// exactly on a stable target with no steady-state error, unlike a
    /// proportional term which would leave an offset.
    fn step(&mut self, target: Rgb, factor_i: i32) {
        self.ri += (target.r as i32 - self.out.r as i32) * factor_i;
        self.gi += (target.g as i32 - self.out.g as i32) * factor_i;
        self.bi += (target.b as i32 - self.out.b as i32) * factor_i;

        self.out = Rgb::new(
            clamp_i32(self.ri / MAX_ICONTROL, 0, 255) as u8,
            clamp_i32(self.gi / MAX_ICONTROL, 0, 255) as u8,
            clamp_i32(self.bi / MAX_ICONTROL, 0, 255) as u8,
        );
    }
}

/// The virtual image: four contiguous runs (right, top, left, bottom)
/// starting at the bottom-right corner and proceeding counter-clockwise.
pub struct VirtualImage {
    right: Vec<ImageCell, { SLOTS_Y }>,
    top: Vec<ImageCell, { SLOTS_X }>,
    left: Vec<ImageCell, { SLOTS_Y }>,
    bottom: Vec<ImageCell, { SLOTS_X }>,
}

impl VirtualImage {
    pub const fn new() -> Self {
        Self { right: Vec::new(), top: Vec::new(), left: Vec::new(), bottom: Vec::new() }
    }

    pub fn right(&self) -> &[ImageCell] {
        &self.right
    }

    pub fn top(&self) -> &[ImageCell] {
        &self.top
    }

    pub fn left(&self) -> &[ImageCell] {
        &self.left
    }

    pub fn bottom(&self) -> &[ImageCell] {
        &self.bottom
    }

    /// Iterate every cell in wiring order (right, top, left, bottom).
    pub fn iter(&self) -> impl Iterator<Item = &ImageCell> {
        self.right.iter().chain(self.top.iter()).chain(self.left.iter()).chain(self.bottom.iter())
    }

    /// Recompute the virtual image for one frame: sample each edge from
    /// `grid` within `rect`, scale to the configured `img_wid`/`img_hig`,
    /// and step every cell's integral controller toward the sampled target.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        grid: &RgbGrid,
        rect: &LetterboxRect,
        img_wid: usize,
        img_hig: usize,
        frame_width: u8,
        factor_i: i32,
    ) {
        resize(&mut self.right, img_hig);
        resize(&mut self.top, img_wid);
        resize(&mut self.left, img_hig);
        resize(&mut self.bottom, img_wid);

        step_run(&mut self.right, grid, rect, Edge::Right, frame_width, factor_i);
        step_run(&mut self.top, grid, rect, Edge::Top, frame_width, factor_i);
        step_run(&mut self.left, grid, rect, Edge::Left, frame_width, factor_i);
        step_run(&mut self.bottom, grid, rect, Edge::Bottom, frame_width, factor_i);
    }
}

impl Default for VirtualImage {
    fn default() -> Self {
        Self::new()
    }
}

fn resize<const N: usize>(run: &mut Vec<ImageCell, N>, len: usize) {
    while run.len() < len {
        let _ = run.push(ImageCell::new());
    }
    run.truncate(len);
}

fn step_run<const N: usize>(
    run: &mut Vec<ImageCell, N>,
    grid: &RgbGrid,
    rect: &LetterboxRect,
    edge: Edge,
    frame_width: u8,
    factor_i: i32,
) {
    let targets = scaled_edge_samples(grid, rect, edge, run.len(), frame_width);
    for (cell, target) in run.iter_mut().zip(targets.iter()) {
        cell.step(*target, factor_i);
    }
}

/// Sample one edge's weighted inward colors at the letterbox's native slot
/// resolution, then Bresenham-scale that run down or up to `img_len` cells,
/// averaging the slots collapsed into each emitted cell.
fn scaled_edge_samples(
    grid: &RgbGrid,
    rect: &LetterboxRect,
    edge: Edge,
    img_len: usize,
    frame_width: u8,
) -> Vec<Rgb, MAX_RUN> {
    let slot_len = match edge {
        | Edge::Top | Edge::Bottom => rect.right + 1 - rect.left,
        | Edge::Left | Edge::Right => rect.bottom + 1 - rect.top,
    };

    let mut out = Vec::new();
    if img_len == 0 || slot_len == 0 {
        return out;
    }

    let mut bresenham = Bresenham::new(slot_len as u32, img_len as u32);
    let (mut sum_r, mut sum_g, mut sum_b, mut count) = (0i32, 0i32, 0i32, 0i32);

    for along in 0..slot_len {
        let (r, g, b) = weighted_inward_sample(grid, rect, edge, along, frame_width);
        sum_r += r;
        sum_g += g;
        sum_b += b;
        count += 1;

        let emitted = bresenham.advance();
        if emitted > 0 {
            let avg = Rgb::new(
                (sum_r / count) as u8,
                (sum_g / count) as u8,
                (sum_b / count) as u8,
            );
            for _ in 0..emitted {
                if out.push(avg).is_err() {
                    break;
                }
            }
            sum_r = 0;
            sum_g = 0;
            sum_b = 0;
            count = 0;
        }
    }

    // A trailing partial accumulation (rounding leftover) fills any remaining
    // cell with its own partial average rather than leaving it unset.
    if count > 0 {
        let avg = Rgb::new((sum_r / count) as u8, (sum_g / count) as u8, (sum_b / count) as u8);
        while out.len() < img_len {
            if out.push(avg).is_err() {
                break;
            }
        }
    }

    out
}

/// Weighted average over `frame_width` slots sampled inward (perpendicular
/// to the edge) from slot index `along` along the edge, within `rect`.
///
/// With `d = 2^(frame_width+1) - 1`, the slot at depth `j` contributes
/// weight `2^(frame_width-j) / d`: the outermost slot dominates and weights
/// halve with depth. Depths that fall outside the rectangle (a narrow
/// letterbox shorter than `frame_width`) contribute nothing, rather than
/// panicking or wrapping.
fn weighted_inward_sample(
    grid: &RgbGrid,
    rect: &LetterboxRect,
    edge: Edge,
    along: usize,
    frame_width: u8,
) -> (i32, i32, i32) {
    let d: i64 = (1i64 << (frame_width as u32 + 1)) - 1;
    let (mut sum_r, mut sum_g, mut sum_b) = (0i64, 0i64, 0i64);

    for j in 0..frame_width as usize {
        let Some(pixel) = sample_at_depth(grid, rect, edge, along, j) else { break };
        let weight = 1i64 << (frame_width as usize - j);
        sum_r += weight * pixel.r as i64;
        sum_g += weight * pixel.g as i64;
        sum_b += weight * pixel.b as i64;
    }

    ((sum_r / d) as i32, (sum_g / d) as i32, (sum_b / d) as i32)
}

fn sample_at_depth(
    grid: &RgbGrid,
    rect: &LetterboxRect,
    edge: Edge,
    along: usize,
    depth: usize,
) -> Option<Rgb> {
    match edge {
        | Edge::Top => {
            let col = rect.left + along;
            let row = rect.top + depth;
            (row <= rect.bottom).then(|| grid.get(row, col))
        }
        | Edge::Bottom => {
            let col = rect.left + along;
            let row = rect.bottom.checked_sub(depth)?;
            (row >= rect.top).then(|| grid.get(row, col))
        }
        | Edge::Left => {
            let row = rect.top + along;
            let col = rect.left + depth;
            (col <= rect.right).then(|| grid.get(row, col))
        }
        | Edge::Right => {
            let row = rect.top + along;
            let col = rect.right.checked_sub(depth)?;
            (col >= rect.left).then(|| grid.get(row, col))
        }
    }
}
