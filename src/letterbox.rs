//! Dynamic letterbox detector (stage C): moving-average estimation of the
//! picture's non-black bounding rectangle.

use crate::consts::{BLACK_SHIFT, DYN_WIN, SLOTS_X, SLOTS_Y};
use crate::grid::RgbGrid;

/// A draining moving-average integrator: `value` accumulates additively every
/// frame; once `frames_limit` frames have accumulated, the quotient becomes
/// the new `avg` and is *subtracted* (not reset to zero) from the running
/// total, giving a low-pass response with time constant `frames_limit`
/// frames rather than a hard window reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainingAvg {
    int_avg: i64,
    pub avg: i32,
    frames: u16,
}

impl DrainingAvg {
    pub const fn new() -> Self {
        Self { int_avg: 0, avg: 0, frames: 0 }
    }

    pub fn integrate(&mut self, value: i32, frames_limit: u16) {
        self.int_avg += value as i64;
        self.frames += 1;
        if frames_limit > 0 && self.frames >= frames_limit {
            self.avg = (self.int_avg / frames_limit as i64) as i32;
            self.int_avg -= self.avg as i64;
            self.frames = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxRect {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl LetterboxRect {
    pub const FULL: Self = Self { left: 0, right: SLOTS_X - 1, top: 0, bottom: SLOTS_Y - 1 };
}

/// Owns the row/column luminance integrators, the black-level floor
/// integrator, and the current rectangle. One instance per pipeline.
pub struct LetterboxDetector {
    row_lum: [DrainingAvg; SLOTS_Y],
    col_lum: [DrainingAvg; SLOTS_X],
    black_level: DrainingAvg,
    pub rect: LetterboxRect,
}

impl LetterboxDetector {
    pub const fn new() -> Self {
        Self {
            row_lum: [DrainingAvg::new(); SLOTS_Y],
            col_lum: [DrainingAvg::new(); SLOTS_X],
            black_level: DrainingAvg::new(),
            rect: LetterboxRect::FULL,
        }
    }

    /// Update the moving averages from one converted RGB grid and recompute
    /// the rectangle. Disabled (fixed at the full grid) when
    /// `frames_limit == 0`.
    pub fn update(&mut self, grid: &RgbGrid, frames_limit: u16) {
        if frames_limit == 0 {
            self.rect = LetterboxRect::FULL;
            return;
        }

        let mut min_row_sum = i32::MAX;
        for (row, stat) in self.row_lum.iter_mut().enumerate() {
            let sum: u32 = grid.row(row).iter().map(|p| p.luma_sum()).sum();
            let sum = sum as i32;
            stat.integrate(sum, frames_limit);
            min_row_sum = min_row_sum.min(sum);
        }
        self.black_level.integrate(min_row_sum, frames_limit);

        for col in 0..SLOTS_X {
            let sum: u32 = grid.column(col).map(|p| p.luma_sum()).sum();
            self.col_lum[col].integrate(sum as i32, frames_limit);
        }

        let black_threshold = self.black_level.avg + BLACK_SHIFT;
        let row_avgs: heapless::Vec<i32, SLOTS_Y> = self.row_lum.iter().map(|s| s.avg).collect();
        let col_avgs: heapless::Vec<i32, SLOTS_X> = self.col_lum.iter().map(|s| s.avg).collect();

        self.rect = LetterboxRect {
            top: search_edge(&row_avgs, black_threshold, true),
            bottom: search_edge(&row_avgs, black_threshold, false),
            left: search_edge(&col_avgs, black_threshold, true),
            right: search_edge(&col_avgs, black_threshold, false),
        };
    }
}

impl Default for LetterboxDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan up to `DYN_WIN` slots inward from one edge of `avgs`.
///
/// `increasing` selects the top/left direction (scan index 0, 1, 2, ...);
/// the bottom/right direction scans `len-1, len-2, ...` instead. The first
/// slot exceeding `black_threshold` wins; failing that, the slot at the
/// largest absolute first-difference wins.
fn search_edge(avgs: &[i32], black_threshold: i32, increasing: bool) -> usize {
    let len = avgs.len();
    let win = DYN_WIN.min(len.saturating_sub(1));

    let index_at = |step: usize| -> usize {
        if increasing { step } else { len - 1 - step }
    };

    for step in 0..win {
        let idx = index_at(step);
        if avgs[idx] > black_threshold {
            return idx;
        }
    }

    let mut best_step = 0;
    let mut best_delta = 0;
    for step in 1..win {
        let idx = index_at(step);
        let prev = index_at(step - 1);
        let delta = (avgs[idx] - avgs[prev]).abs();
        if delta > best_delta {
            best_delta = delta;
            best_step = step;
        }
    }
    index_at(best_step)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grid::Rgb;

    fn uniform_grid(color: Rgb) -> RgbGrid {
        let mut g = RgbGrid::new();
        for row in 0..SLOTS_Y {
            for col in 0..SLOTS_X {
                g.set(row, col, color);
            }
        }
        g
    }

    #[test]
    fn disabled_when_frames_limit_zero() {
        let mut det = LetterboxDetector::new();
        det.update(&uniform_grid(Rgb::new(200, 200, 200)), 0);
        assert_eq!(det.rect, LetterboxRect::FULL);
    }

    #[test]
    fn full_letterbox_settles_on_the_non_black_band() {
        let mut det = LetterboxDetector::new();
        let mut grid = uniform_grid(Rgb::new(230, 230, 230));
        for row in 0..8 {
            for col in 0..SLOTS_X {
                grid.set(row, col, Rgb::BLACK);
                grid.set(SLOTS_Y - 1 - row, col, Rgb::BLACK);
            }
        }

        for _ in 0..100 {
            det.update(&grid, 100);
        }

        assert_eq!(det.rect.top, 8);
        assert_eq!(det.rect.bottom, SLOTS_Y - 1 - 8);
        assert_eq!(det.rect.left, 0);
        assert_eq!(det.rect.right, SLOTS_X - 1);
    }

    #[test]
    fn search_edge_falls_back_to_max_first_difference_without_a_black_band() {
        // No value crosses the threshold; the step with the steepest jump wins.
        let mut avgs = [100i32; SLOTS_X];
        avgs[3] = 400;
        let idx = search_edge(&avgs, 1_000_000, true);
        assert_eq!(idx, 3);
    }
}
