//! Half-block image rendering.

use crate::app::App;
use crate::tiles::Tile;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
    Frame,
};

/// Draws a [`Tile`] with one `▀` per cell: foreground is the upper pixel,
/// background the lower one.
///
/// A tile larger than the area is cropped around its centre.
pub(super) struct TileWidget<'a> {
    tile: &'a Tile,
}

impl<'a> TileWidget<'a> {
    pub(super) fn new(tile: &'a Tile) -> Self {
        Self { tile }
    }
}

impl Widget for TileWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let skip_cols = self.tile.cols().saturating_sub(area.width) / 2;
        let skip_rows = self.tile.rows().saturating_sub(area.height) / 2;
        let width = area.width.min(self.tile.cols());
        let height = area.height.min(self.tile.rows());

        for row in 0..height {
            for col in 0..width {
                let Some((top, bottom)) = self.tile.cell(col + skip_cols, row + skip_rows) else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol("▀")
                        .set_fg(Color::Rgb(top[0], top[1], top[2]))
                        .set_bg(bottom.map_or(Color::Reset, |p| Color::Rgb(p[0], p[1], p[2])));
                }
            }
        }
    }
}

/// Draw the image at `source` scaled to cover `area`.
///
/// Draws nothing while the image is loading or when images are off; the
/// cache asks for a repaint once it arrives.
pub(super) fn draw_image(f: &mut Frame, app: &App, source: &str, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let Some(tiles) = app.tiles.as_ref() else {
        return;
    };
    if let Some(tile) = tiles.get(source, area.width, area.height) {
        f.render_widget(TileWidget::new(&tile), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_tile_widget_paints_half_blocks() {
        let raw = RgbImage::from_pixel(2, 4, Rgb([255, 0, 0]));
        let tile = Tile::cover(&raw, 2, 2);
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        TileWidget::new(&tile).render(area, &mut buf);

        let cell = &buf[(1, 1)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_tile_widget_crops_to_area() {
        let raw = RgbImage::from_pixel(8, 2, Rgb([1, 2, 3]));
        let tile = Tile::cover(&raw, 4, 1);
        assert!(tile.cols() > 4);

        let area = Rect::new(0, 0, 4, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 1));
        TileWidget::new(&tile).render(area, &mut buf);
        assert_eq!(buf[(3, 0)].symbol(), "▀");
        assert_eq!(buf[(4, 0)].symbol(), " ");
    }
}
