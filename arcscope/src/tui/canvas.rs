//! Terminal cell canvas
//!
//! A [`Surface`] whose layout unit is one terminal cell. Rectangles fill cell
//! backgrounds, lines and polylines are drawn with box and dot glyphs, and the
//! result is blitted into a ratatui buffer with a vertical scroll offset.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use arcscope_common::Rgb;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use super::theme::{to_color, CANVAS_BACKGROUND};
use crate::surface::{Point, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Option<Color>,
    bg: Option<Color>,
}

const BLANK: Cell = Cell { ch: ' ', fg: None, bg: None };

/// Grid of cells covering a whole layout
#[derive(Debug, Clone)]
pub struct CellCanvas {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl CellCanvas {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height, cells: vec![BLANK; usize::from(width) * usize::from(height)] }
    }

    /// Canvas sized to hold `width` x `height` layout units
    #[must_use]
    pub fn for_layout(width: f64, height: f64) -> Self {
        Self::new(width.ceil().clamp(0.0, f64::from(u16::MAX)) as u16, height.ceil().clamp(0.0, f64::from(u16::MAX)) as u16)
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    fn cell_mut(&mut self, x: i64, y: i64) -> Option<&mut Cell> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        let index = y as usize * usize::from(self.width) + x as usize;
        self.cells.get_mut(index)
    }

    fn plot(&mut self, x: i64, y: i64, ch: char, color: Rgb) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.ch = ch;
            cell.fg = Some(to_color(color));
        }
    }

    /// Character at a cell, for tests
    #[must_use]
    pub fn char_at(&self, x: u16, y: u16) -> Option<char> {
        self.cells.get(usize::from(y) * usize::from(self.width) + usize::from(x)).map(|c| c.ch)
    }

    /// Background at a cell, for tests
    #[must_use]
    pub fn background_at(&self, x: u16, y: u16) -> Option<Color> {
        self.cells.get(usize::from(y) * usize::from(self.width) + usize::from(x)).and_then(|c| c.bg)
    }

    /// Widget drawing rows `scroll..` of the canvas
    #[must_use]
    pub fn view(&self, scroll: u16) -> CanvasView<'_> {
        CanvasView { canvas: self, scroll }
    }
}

impl Surface for CellCanvas {
    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        // Spans narrower than a cell still get one.
        let x0 = x.floor() as i64;
        let x1 = ((x + width).ceil() as i64).max(x0 + 1);
        let y0 = y.floor() as i64;
        let y1 = ((y + height).ceil() as i64).max(y0 + 1);
        for cy in y0..y1 {
            for cx in x0..x1 {
                if let Some(cell) = self.cell_mut(cx, cy) {
                    cell.bg = Some(to_color(color));
                }
            }
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb, _width: f64) {
        let (x0, y0) = (from.x.floor() as i64, from.y.floor() as i64);
        let (x1, y1) = (to.x.floor() as i64, to.y.floor() as i64);
        if x0 == x1 {
            for y in y0.min(y1)..y0.max(y1) {
                self.plot(x0, y, '│', color);
            }
        } else if y0 == y1 {
            for x in x0.min(x1)..x0.max(x1) {
                self.plot(x, y0, '─', color);
            }
        } else {
            self.draw_polyline(&[from, to], color, 1.0);
        }
    }

    fn draw_polyline(&mut self, points: &[Point], color: Rgb, _width: f64) {
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (x0, x1) = (a.x.floor() as i64, b.x.floor() as i64);
            if x0 == x1 {
                self.plot(x0, b.y.floor() as i64, '•', color);
                continue;
            }
            for x in x0..=x1 {
                let t = (x - x0) as f64 / (x1 - x0) as f64;
                let y = a.y + (b.y - a.y) * t;
                self.plot(x, y.floor() as i64, '•', color);
            }
        }
        if let [only] = points {
            self.plot(only.x.floor() as i64, only.y.floor() as i64, '•', color);
        }
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Rgb, _size: f64) {
        let (x, y) = (at.x.floor() as i64, at.y.floor() as i64);
        for (offset, ch) in (0i64..).zip(text.chars()) {
            self.plot(x + offset, y, ch, color);
        }
    }

    fn draw_circle(&mut self, center: Point, _radius: f64, color: Rgb) {
        self.plot(center.x.floor() as i64, center.y.floor() as i64, '●', color);
    }
}

/// Scrolled view of a [`CellCanvas`]
pub struct CanvasView<'a> {
    canvas: &'a CellCanvas,
    scroll: u16,
}

impl Widget for CanvasView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            let y = row.saturating_add(self.scroll);
            for col in 0..area.width.min(self.canvas.width) {
                let Some(target) = buf.cell_mut((area.x + col, area.y + row)) else {
                    continue;
                };
                let cell = if y < self.canvas.height {
                    self.canvas.cells[usize::from(y) * usize::from(self.canvas.width) + usize::from(col)]
                } else {
                    BLANK
                };
                target.set_char(cell.ch);
                target.set_bg(cell.bg.unwrap_or(CANVAS_BACKGROUND));
                if let Some(fg) = cell.fg {
                    target.set_fg(fg);
                } else {
                    target.set_fg(Color::Black);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fills_backgrounds() {
        let mut canvas = CellCanvas::new(10, 3);
        canvas.draw_rect(2.0, 1.0, 3.0, 1.0, Rgb(255, 0, 0));
        assert_eq!(canvas.background_at(2, 1), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(canvas.background_at(4, 1), Some(Color::Rgb(255, 0, 0)));
        assert_eq!(canvas.background_at(5, 1), None);
        assert_eq!(canvas.background_at(2, 0), None);
    }

    #[test]
    fn test_narrow_rect_gets_one_cell() {
        let mut canvas = CellCanvas::new(10, 1);
        canvas.draw_rect(3.2, 0.0, 0.1, 1.0, Rgb(0, 255, 0));
        assert_eq!(canvas.background_at(3, 0), Some(Color::Rgb(0, 255, 0)));
    }

    #[test]
    fn test_text_is_clipped() {
        let mut canvas = CellCanvas::new(4, 1);
        canvas.draw_text(Point::new(1.0, 0.0), "CPU 0", Rgb(0, 0, 0), 1.0);
        assert_eq!(canvas.char_at(1, 0), Some('C'));
        assert_eq!(canvas.char_at(3, 0), Some('U'));
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = CellCanvas::new(3, 3);
        canvas.draw_line(Point::new(1.0, 0.0), Point::new(1.0, 3.0), Rgb(1, 1, 1), 1.0);
        assert_eq!(canvas.char_at(1, 2), Some('│'));
    }

    #[test]
    fn test_scrolled_blit() {
        let mut canvas = CellCanvas::new(3, 4);
        canvas.draw_text(Point::new(0.0, 2.0), "ab", Rgb(0, 0, 0), 1.0);
        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        canvas.view(2).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "a");
        assert_eq!(buf[(1, 0)].symbol(), "b");
    }
}
