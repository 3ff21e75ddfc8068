//! Vector drawing surface
//!
//! Layout and query code draws through the [`Surface`] trait only, so it runs
//! headless in tests. Backends: [`RecordingSurface`] (in memory), the SVG
//! writer in `export::svg`, and the terminal cell canvas in `tui::canvas`.

use arcscope_common::Rgb;

/// Point in layout pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Minimal vector drawing interface
pub trait Surface {
    /// Filled axis-aligned rectangle
    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb);
    /// Straight stroke
    fn draw_line(&mut self, from: Point, to: Point, color: Rgb, width: f64);
    /// Open polyline through `points`
    fn draw_polyline(&mut self, points: &[Point], color: Rgb, width: f64);
    /// Text whose top-left corner is at `at`
    fn draw_text(&mut self, at: Point, text: &str, color: Rgb, size: f64);
    /// Filled circle
    fn draw_circle(&mut self, center: Point, radius: f64, color: Rgb);
}

/// A single recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect { x: f64, y: f64, width: f64, height: f64, color: Rgb },
    Line { from: Point, to: Point, color: Rgb, width: f64 },
    Polyline { points: Vec<Point>, color: Rgb, width: f64 },
    Text { at: Point, text: String, color: Rgb, size: f64 },
    Circle { center: Point, radius: f64, color: Rgb },
}

impl Primitive {
    /// Issue this primitive on another surface
    pub fn draw(&self, surface: &mut dyn Surface) {
        match self {
            Primitive::Rect { x, y, width, height, color } => {
                surface.draw_rect(*x, *y, *width, *height, *color);
            }
            Primitive::Line { from, to, color, width } => surface.draw_line(*from, *to, *color, *width),
            Primitive::Polyline { points, color, width } => {
                surface.draw_polyline(points, *color, *width);
            }
            Primitive::Text { at, text, color, size } => surface.draw_text(*at, text, *color, *size),
            Primitive::Circle { center, radius, color } => {
                surface.draw_circle(*center, *radius, *color);
            }
        }
    }
}

/// Headless surface that records every call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSurface {
    primitives: Vec<Primitive>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Recorded rectangles as `(x, y, width, height, color)`
    pub fn rects(&self) -> impl Iterator<Item = (f64, f64, f64, f64, Rgb)> + '_ {
        self.primitives.iter().filter_map(|p| match *p {
            Primitive::Rect { x, y, width, height, color } => Some((x, y, width, height, color)),
            _ => None,
        })
    }

    /// Recorded polylines
    pub fn polylines(&self) -> impl Iterator<Item = &[Point]> + '_ {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Polyline { points, .. } => Some(points.as_slice()),
            _ => None,
        })
    }

    /// Recorded text strings
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Replay everything onto `surface`, in recording order
    pub fn replay(&self, surface: &mut dyn Surface) {
        for primitive in &self.primitives {
            primitive.draw(surface);
        }
    }
}

impl Surface for RecordingSurface {
    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        self.primitives.push(Primitive::Rect { x, y, width, height, color });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb, width: f64) {
        self.primitives.push(Primitive::Line { from, to, color, width });
    }

    fn draw_polyline(&mut self, points: &[Point], color: Rgb, width: f64) {
        self.primitives.push(Primitive::Polyline { points: points.to_vec(), color, width });
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Rgb, size: f64) {
        self.primitives.push(Primitive::Text { at, text: text.to_string(), color, size });
    }

    fn draw_circle(&mut self, center: Point, radius: f64, color: Rgb) {
        self.primitives.push(Primitive::Circle { center, radius, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_preserves_order() {
        let mut first = RecordingSurface::new();
        first.draw_rect(0.0, 0.0, 10.0, 5.0, Rgb(1, 2, 3));
        first.draw_text(Point::new(1.0, 1.0), "cpu 0", Rgb(0, 0, 0), 10.0);
        first.draw_circle(Point::new(2.0, 2.0), 4.0, Rgb(255, 0, 0));

        let mut second = RecordingSurface::new();
        first.replay(&mut second);

        assert_eq!(first, second);
        assert_eq!(second.rects().count(), 1);
        assert_eq!(second.texts().collect::<Vec<_>>(), vec!["cpu 0"]);
    }
}
