use crate::rule::TileColor;
use crate::spiral::Offset;
use crate::stepper::CellSink;

/// CPU-side square pixel buffer the spiral is painted into.
///
/// Offsets are relative to the canvas centre. Pixels are packed RGBA (see
/// [`TileColor::rgba`]) and uploaded to the GPU as-is.
pub struct TileCanvas {
    size: u32,
    pixels: Vec<u32>,
    dirty: bool,
}

impl TileCanvas {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![TileColor::Transparent.rgba(); (size as usize) * (size as usize)],
            dirty: true,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.size && y < self.size {
            Some(self.pixels[y as usize * self.size as usize + x as usize])
        } else {
            None
        }
    }

    /// Reset every pixel to transparent, reallocating if the size changed.
    pub fn reset(&mut self, size: u32) {
        if size != self.size {
            self.size = size;
            self.pixels = vec![0; (size as usize) * (size as usize)];
        }
        self.pixels.fill(TileColor::Transparent.rgba());
        self.dirty = true;
    }

    /// Whether anything changed since the last call; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Fill `[left, left + extent) x [top, top + extent)`, clipped to the canvas.
    ///
    /// Fully transparent colour leaves the pixels untouched, like a
    /// source-over fill would.
    pub fn fill_square(&mut self, left: f64, top: f64, extent: f64, color: TileColor) {
        let rgba = color.rgba();
        if rgba >> 24 == 0 {
            return;
        }
        let size = self.size as f64;
        let x0 = left.round().clamp(0.0, size) as usize;
        let x1 = (left + extent).round().clamp(0.0, size) as usize;
        let y0 = top.round().clamp(0.0, size) as usize;
        let y1 = (top + extent).round().clamp(0.0, size) as usize;
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = self.size as usize;
        for row in self.pixels[y0 * stride..y1 * stride].chunks_exact_mut(stride) {
            row[x0..x1].fill(rgba);
        }
        self.dirty = true;
    }
}

impl CellSink<TileColor> for TileCanvas {
    fn paint(&mut self, offset: Offset, tile_size: f64, value: TileColor) {
        let mid = self.size as f64 / 2.0;
        self.fill_square(mid + offset.x, mid + offset.y, tile_size, value);
    }
}
