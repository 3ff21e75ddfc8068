//! SVG document output
//!
//! Drawing calls go straight to a `plotters` SVG backend in drawing order, so
//! later primitives paint over earlier ones exactly as in the interactive
//! views. Coordinates are rounded to whole pixels.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use arcscope_common::Rgb;
use log::info;
use plotters::backend::SVGBackend;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Rectangle, Text};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color, FontDesc, FontFamily, FontStyle, RGBColor, WHITE};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ExportError;
use crate::layout::BandLayout;
use crate::surface::{Point, Surface};

/// Surface drawing into an SVG document held in a borrowed string
pub struct SvgSurface<'a> {
    root: DrawingArea<SVGBackend<'a>, Shift>,
    elements: usize,
    /// First backend failure; drawing calls can't return one
    error: Option<String>,
}

impl<'a> SvgSurface<'a> {
    /// Start a `width` x `height` document with a white background.
    #[must_use]
    pub fn new(buffer: &'a mut String, width: f64, height: f64) -> Self {
        let size = (width.ceil().max(1.0) as u32, height.ceil().max(1.0) as u32);
        let root = SVGBackend::with_string(buffer, size).into_drawing_area();
        let error = root.fill(&WHITE).err().map(|e| e.to_string());
        Self { root, elements: 0, error }
    }

    /// Number of elements drawn so far, background excluded
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements
    }

    /// Close the document.
    ///
    /// # Errors
    /// Returns the first backend failure seen while drawing.
    pub fn finish(self) -> Result<(), ExportError> {
        if let Some(error) = self.error {
            return Err(ExportError::Render(error));
        }
        self.root.present().map_err(|e| ExportError::Render(e.to_string()))
    }

    fn record<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        self.elements += 1;
        if let Err(e) = result {
            self.error.get_or_insert_with(|| e.to_string());
        }
    }
}

fn px(point: Point) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn stroke(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

impl Surface for SvgSurface<'_> {
    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        let corners = [px(Point::new(x, y)), px(Point::new(x + width, y + height))];
        let result = self.root.draw(&Rectangle::new(corners, rgb(color).filled()));
        self.record(result);
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Rgb, width: f64) {
        let result = self
            .root
            .draw(&PathElement::new(vec![px(from), px(to)], rgb(color).stroke_width(stroke(width))));
        self.record(result);
    }

    fn draw_polyline(&mut self, points: &[Point], color: Rgb, width: f64) {
        let coords: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
        let result = self.root.draw(&PathElement::new(coords, rgb(color).stroke_width(stroke(width))));
        self.record(result);
    }

    fn draw_text(&mut self, at: Point, text: &str, color: Rgb, size: f64) {
        let style = FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
            .color(&rgb(color))
            .pos(Pos::new(HPos::Left, VPos::Top));
        let result = self.root.draw(&Text::new(text.to_string(), px(at), style));
        self.record(result);
    }

    fn draw_circle(&mut self, center: Point, radius: f64, color: Rgb) {
        let result = self.root.draw(&Circle::new(px(center), radius, rgb(color).filled()));
        self.record(result);
    }
}

/// Render `layout` into a complete SVG document.
///
/// # Errors
/// Returns an error if the SVG backend fails.
pub fn render_svg(layout: &BandLayout) -> Result<String, ExportError> {
    let mut buffer = String::new();
    let mut surface = SvgSurface::new(&mut buffer, layout.width(), layout.height());
    layout.render(&mut surface);
    surface.finish()?;
    Ok(buffer)
}

/// Write `layout` as SVG to `writer`.
///
/// # Errors
/// Returns an error if rendering or writing fails.
pub fn write_svg(layout: &BandLayout, mut writer: impl Write) -> Result<(), ExportError> {
    writer.write_all(render_svg(layout)?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write `layout` as SVG to the file at `path`.
///
/// # Errors
/// Returns an error if the file can't be created or written.
pub fn export_svg(layout: &BandLayout, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)
        .map_err(|e| ExportError::WriteFailed(format!("{}: {e}", path.display())))?;
    write_svg(layout, BufWriter::new(file))?;
    info!("Wrote SVG {} ({}x{})", path.display(), layout.width(), layout.height());
    Ok(())
}
