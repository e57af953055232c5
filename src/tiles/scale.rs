use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Pixel size that covers a `box_w` x `box_h` box while keeping the
/// `raw_w` x `raw_h` aspect ratio.
///
/// Uses the larger of the two axis factors, so one side matches the box and
/// the other overflows it. Integer math keeps the result exact; the
/// overflowing side is rounded up so it never falls short of the box.
///
/// ```
/// use mastty::tiles::cover_dimensions;
///
/// assert_eq!(cover_dimensions(100, 50, 24, 24), (48, 24));
/// assert_eq!(cover_dimensions(50, 100, 24, 24), (24, 48));
/// ```
pub fn cover_dimensions(raw_w: u32, raw_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if raw_w == 0 || raw_h == 0 {
        return (box_w, box_h);
    }
    let (rw, rh, bw, bh) = (raw_w as u64, raw_h as u64, box_w as u64, box_h as u64);

    // box_w / raw_w >= box_h / raw_h, cross-multiplied
    if bw * rh >= bh * rw {
        (box_w, (rh * bw).div_ceil(rw) as u32)
    } else {
        ((rw * bh).div_ceil(rh) as u32, box_h)
    }
}

/// A decoded image scaled for a specific cell box.
///
/// Each cell shows two vertically stacked pixels, so a tile of `rows`
/// cells is backed by `2 * rows` pixel rows. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Tile {
    pixels: Arc<RgbImage>,
    cols: u16,
    rows: u16,
}

impl Tile {
    /// Scale `raw` so that it covers `cols` x `rows` cells.
    pub fn cover(raw: &RgbImage, cols: u16, rows: u16) -> Self {
        let box_w = u32::from(cols);
        let box_h = u32::from(rows) * 2;
        let (w, h) = cover_dimensions(raw.width(), raw.height(), box_w, box_h);
        let pixels = imageops::resize(raw, w.max(1), h.max(1), FilterType::Triangle);

        let cols = u16::try_from(pixels.width()).unwrap_or(u16::MAX);
        let rows = u16::try_from(pixels.height().div_ceil(2)).unwrap_or(u16::MAX);
        Self {
            pixels: Arc::new(pixels),
            cols,
            rows,
        }
    }

    /// Width in cells.
    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// Height in cells.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Colours for the upper and lower half of cell (`col`, `row`). The
    /// lower half is `None` on the last row of an odd-height image.
    pub fn cell(&self, col: u16, row: u16) -> Option<(Rgb<u8>, Option<Rgb<u8>>)> {
        let x = u32::from(col);
        let y = u32::from(row) * 2;
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return None;
        }
        let top = *self.pixels.get_pixel(x, y);
        let bottom = (y + 1 < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y + 1));
        Some((top, bottom))
    }
}
