//! Square (Ulam) spiral enumeration.
//!
//! The walk runs on an integer lattice starting at the origin, heading along
//! `-y` and turning counter-clockwise (in screen space, where `y` grows
//! downwards) at the ring corners. Positions are scaled by the tile size
//! only on the way out, so the turn points never drift with float error.

/// A position on the spiral lattice, in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatticePoint {
    pub x: i64,
    pub y: i64,
}

impl LatticePoint {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Offset from the spiral centre in tile-size units.
    pub fn scaled(self, tile_size: f64) -> Offset {
        Offset {
            x: self.x as f64 * tile_size,
            y: self.y as f64 * tile_size,
        }
    }
}

/// Offset of a cell from the spiral centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Running cursor over the spiral: O(1) per index.
///
/// A fresh cursor always reproduces the same sequence, so restarting a walk
/// is as simple as building a new one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpiralCursor {
    pos: LatticePoint,
    dx: i64,
    dy: i64,
}

impl Default for SpiralCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiralCursor {
    pub fn new() -> Self {
        Self {
            pos: LatticePoint::ORIGIN,
            dx: 0,
            dy: -1,
        }
    }

    /// Position of the index the cursor currently sits on.
    pub fn position(&self) -> LatticePoint {
        self.pos
    }

    /// Move to the next index, turning first if the current cell is a corner.
    pub fn advance(&mut self) {
        let LatticePoint { x, y } = self.pos;
        if x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
            (self.dx, self.dy) = (-self.dy, self.dx);
        }
        self.pos.x += self.dx;
        self.pos.y += self.dy;
    }
}

impl Iterator for SpiralCursor {
    type Item = LatticePoint;

    fn next(&mut self) -> Option<LatticePoint> {
        let current = self.pos;
        self.advance();
        Some(current)
    }
}

fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).map_or(false, |sq| sq <= n) {
        root += 1;
    }
    root
}

/// Lattice position of spiral index `i` without walking the spiral.
///
/// Ring `k >= 1` holds indices `(2k-1)^2 .. (2k+1)^2` and starts at
/// `(k, 1-k)`; its four sides run `+y`, `-x`, `-y`, `+x`.
pub fn lattice_point(i: u64) -> LatticePoint {
    if i == 0 {
        return LatticePoint::ORIGIN;
    }
    let k = (isqrt(i) + 1) / 2;
    let m = (i - (2 * k - 1) * (2 * k - 1)) as i64;
    let k = k as i64;
    let side = 2 * k;

    if m < side {
        LatticePoint { x: k, y: 1 - k + m }
    } else if m < 2 * side {
        LatticePoint { x: k - (m - side + 1), y: k }
    } else if m < 3 * side {
        LatticePoint { x: -k, y: k - (m - 2 * side + 1) }
    } else {
        LatticePoint { x: -k + (m - 3 * side + 1), y: -k }
    }
}

/// Offset of spiral index `i` for the given tile size.
pub fn cell_offset(i: u64, tile_size: f64) -> Offset {
    lattice_point(i).scaled(tile_size)
}

/// Number of indices walked to cover a `width` square: every `i` with
/// `i < (width / tile_size)^2`.
pub fn num_cells(width: f64, tile_size: f64) -> u64 {
    let per_side = width / tile_size;
    let cells = (per_side * per_side).ceil();
    if cells.is_finite() && cells > 0.0 {
        cells as u64
    } else {
        0
    }
}

/// The visible square around the spiral centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
}

impl Viewport {
    pub fn new(width: f64) -> Self {
        Self { width }
    }

    /// Half-open on the negative side, closed on the positive side.
    pub fn contains(&self, offset: Offset) -> bool {
        let half = self.width / 2.0;
        -half < offset.x && offset.x <= half && -half < offset.y && offset.y <= half
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lp(x: i64, y: i64) -> LatticePoint {
        LatticePoint { x, y }
    }

    #[test]
    fn test_first_ring_layout() {
        let walked: Vec<_> = SpiralCursor::new().take(10).collect();
        assert_eq!(
            walked,
            vec![
                lp(0, 0),
                lp(1, 0),
                lp(1, 1),
                lp(0, 1),
                lp(-1, 1),
                lp(-1, 0),
                lp(-1, -1),
                lp(0, -1),
                lp(1, -1),
                lp(2, -1),
            ]
        );
    }

    #[test]
    fn test_restart_reproduces_sequence() {
        let first: Vec<_> = SpiralCursor::new().take(5000).collect();
        let second: Vec<_> = SpiralCursor::new().take(5000).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_closed_form_matches_cursor() {
        for (i, walked) in SpiralCursor::new().take(20_000).enumerate() {
            assert_eq!(lattice_point(i as u64), walked, "mismatch at index {}", i);
        }
    }

    #[test]
    fn test_every_lattice_point_visited_once() {
        // 81 indices fill the 9x9 square centred on the origin exactly
        let mut seen = std::collections::HashSet::new();
        for point in SpiralCursor::new().take(81) {
            assert!(point.x.abs() <= 4 && point.y.abs() <= 4, "{:?} outside 9x9", point);
            assert!(seen.insert(point), "{:?} visited twice", point);
        }
        assert_eq!(seen.len(), 81);
    }

    #[test]
    fn test_cell_offset_scales_by_tile() {
        assert_eq!(cell_offset(2, 4.0), Offset { x: 4.0, y: 4.0 });
        assert_eq!(cell_offset(9, 2.5), Offset { x: 5.0, y: -2.5 });
        assert_eq!(cell_offset(0, 7.0), Offset { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_num_cells() {
        assert_eq!(num_cells(8.0, 1.0), 64);
        assert_eq!(num_cells(300.0, 4.0), 5625);
        // (300 / 7)^2 = 1836.73..., so indices 0..=1836 are walked
        assert_eq!(num_cells(300.0, 7.0), 1837);
        assert_eq!(num_cells(0.0, 1.0), 0);
    }

    #[test]
    fn test_visibility_boundary() {
        let view = Viewport::new(4.0);
        // positive edge is inclusive
        assert!(view.contains(Offset { x: 2.0, y: 2.0 }));
        assert!(view.contains(Offset { x: 2.0, y: -1.0 }));
        // negative edge is exclusive
        assert!(!view.contains(Offset { x: -2.0, y: 0.0 }));
        assert!(!view.contains(Offset { x: 0.0, y: -2.0 }));
        assert!(!view.contains(Offset { x: -2.0, y: -2.0 }));
        assert!(view.contains(Offset { x: -1.0, y: -1.0 }));
        // beyond the positive edge
        assert!(!view.contains(Offset { x: 3.0, y: 0.0 }));
        assert!(!view.contains(Offset { x: 0.0, y: 2.5 }));
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
    }
}
