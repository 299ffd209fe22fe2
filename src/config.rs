use std::time::Duration;

use crate::error::PassError;
use crate::spiral;

/// Canvas extent in pixels (the spiral covers a width x width square)
pub const DEFAULT_CANVAS_WIDTH: f64 = 300.0;

/// Edge length of one spiral cell in pixels
pub const DEFAULT_TILE_SIZE: f64 = 4.0;

/// Miller-Rabin rounds used to decide whether a cell is marked
pub const DEFAULT_ITERATIONS: u32 = 1;

/// Whether marked cells are re-checked with the reference round count
pub const DEFAULT_HIGHLIGHT_FALSE_PRIMES: bool = true;

// ============================================
// Host controls
// ============================================

pub const MIN_CANVAS_WIDTH: f64 = 50.0;
pub const MAX_CANVAS_WIDTH: f64 = 1000.0;

/// Canvas size step for the -/= keys
pub const CANVAS_WIDTH_STEP: f64 = 50.0;

pub const MIN_TILE_SIZE: f64 = 1.0;

/// Probability threshold for random mode (mark odd cells above it)
pub const RANDOM_MARK_THRESHOLD: f64 = 0.8;

/// Time slice a pass may use per frame before yielding back to winit
pub const FRAME_BUDGET: Duration = Duration::from_millis(8);

/// Initial window edge in logical pixels
pub const WINDOW_SIZE: u32 = 800;

/// Parameters fixed for the lifetime of one drawing pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassParams {
    /// Total extent of the drawn square
    pub width: f64,
    /// Edge of one cell, > 0
    pub tile_size: f64,
    /// Miller-Rabin rounds for the mark decision
    pub iterations: u32,
}

impl Default for PassParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            tile_size: DEFAULT_TILE_SIZE,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl PassParams {
    /// Check the preconditions a pass needs before its first step.
    pub fn validate(&self) -> Result<(), PassError> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(PassError::NonPositiveTileSize(self.tile_size));
        }
        if !(self.width.is_finite() && self.width >= 0.0) {
            return Err(PassError::InvalidWidth(self.width));
        }
        let per_side = self.width / self.tile_size;
        let cells = per_side * per_side;
        // 2^53: beyond this the f64 cell count no longer names an exact index
        if !cells.is_finite() || cells > 9_007_199_254_740_992.0 {
            return Err(PassError::TooManyCells(cells));
        }
        Ok(())
    }

    /// Number of spiral indices this pass walks.
    pub fn num_cells(&self) -> u64 {
        spiral::num_cells(self.width, self.tile_size)
    }
}
