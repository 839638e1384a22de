//! Line ingest (stage A): DMA-driven half-frame capture and per-block YCbCr
//! accumulation.
//!
//! The hardware line buffer is reinterpreted as a slice of [`PixelTuple`]
//! without copying, the way the reference app's framebuffer layer treats raw
//! DMA targets as `bytemuck`-safe byte buffers rather than hand-rolled
//! pointer casts.

use bytemuck::{Pod, Zeroable};

use crate::consts::{SLOTS_X, SLOTS_Y};
use crate::error::{PipelineError, Result};
use crate::grid::SlotAccumGrid;
use crate::util::Bresenham;

/// One BT.656 4:2:2 word: two luma samples sharing one chroma pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PixelTuple {
    pub cb: u8,
    pub y0: u8,
    pub cr: u8,
    pub y1: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Left,
    Right,
}

impl Half {
    pub const fn flipped(self) -> Self {
        match self {
            | Self::Left => Self::Right,
            | Self::Right => Self::Left,
        }
    }

    /// The slot-column range owned by this half while it is the *target* of
    /// ongoing capture (and hence off-limits to the vsync handler's read).
    pub const fn column_range(self) -> core::ops::Range<usize> {
        match self {
            | Self::Left => 0..SLOTS_X / 2,
            | Self::Right => SLOTS_X / 2..SLOTS_X,
        }
    }
}

/// Cursors walking the slot grid as DMA line/word events arrive.
///
/// `col` distributes `dma_width` word-tuples of one line across the half's
/// slot columns; `row` distributes `crop_height` captured lines across the
/// slot rows. Both use the fixed `>=`-draining Bresenham rule.
pub struct Cursors {
    col: Bresenham,
    row: Bresenham,
    row_index: usize,
    col_index: usize,
    col_base: usize,
}

impl Cursors {
    pub fn new(dma_width: u32, crop_height: u32, half: Half) -> Self {
        let half_cols = (SLOTS_X / 2) as u32;
        Self {
            col: Bresenham::new(dma_width, half_cols),
            row: Bresenham::new(crop_height, SLOTS_Y as u32),
            row_index: 0,
            col_index: 0,
            col_base: half.column_range().start,
        }
    }

    /// Feed one captured line (as raw word-tuples) into `grid`, advancing the
    /// row cursor by one line and the column cursor once per tuple.
    ///
    /// Returns [`PipelineError::CaptureFault`] if the line is longer than the
    /// configured DMA width (a decoder or DMA misconfiguration); the caller
    /// discards the line and continues, as the capture stage never blocks
    /// pipeline progress on a fault.
    pub fn ingest_line(&mut self, line: &[PixelTuple], grid: &mut SlotAccumGrid) -> Result<()> {
        self.col.reset();
        self.col_index = 0;
        for tuple in line {
            if self.row_index >= SLOTS_Y {
                return Err(PipelineError::CaptureFault);
            }
            let cell = grid.cell_mut(self.row_index, self.col_base + self.col_index);
            cell.accumulate(tuple.y0, tuple.y1, tuple.cb, tuple.cr);

            let advance = self.col.advance();
            self.col_index = (self.col_index + advance as usize).min(SLOTS_X / 2 - 1);
        }
        self.row_index += self.row.advance() as usize;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.col.reset();
        self.row.reset();
        self.row_index = 0;
        self.col_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn solid_line(len: usize, cb: u8, y: u8, cr: u8) -> heapless::Vec<PixelTuple, 1024> {
        let mut v = heapless::Vec::new();
        for _ in 0..len {
            v.push(PixelTuple { cb, y0: y, cr, y1: y }).unwrap();
        }
        v
    }

    #[test]
    fn a_full_field_of_uniform_lines_fills_every_slot() {
        let mut grid = SlotAccumGrid::new();
        let mut left = Cursors::new(360, 576, Half::Left);
        let line = solid_line(360, 128, 128, 128);

        for _ in 0..576 {
            left.ingest_line(&line, &mut grid).unwrap();
        }

        for row in 0..SLOTS_Y {
            for col in 0..SLOTS_X / 2 {
                assert!(grid.cell(row, col).count > 0, "row {row} col {col} untouched");
            }
        }
    }

    #[test]
    fn left_and_right_halves_write_disjoint_columns() {
        assert_eq!(Half::Left.column_range(), 0..SLOTS_X / 2);
        assert_eq!(Half::Right.column_range(), SLOTS_X / 2..SLOTS_X);
    }

    #[test]
    fn overlong_line_reports_capture_fault_without_panicking() {
        let mut grid = SlotAccumGrid::new();
        let mut cursors = Cursors::new(360, 576, Half::Left);
        cursors.row_index = SLOTS_Y; // force out-of-range
        let line = solid_line(1, 128, 128, 128);
        assert_eq!(cursors.ingest_line(&line, &mut grid), Err(PipelineError::CaptureFault));
    }
}
