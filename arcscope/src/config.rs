//! View configuration
//!
//! All geometry is in layout units: pixels for SVG output, terminal cells for
//! the TUI. `ViewConfig` is built from CLI arguments in `main`.

#![allow(clippy::cast_precision_loss)]

use crate::domain::Micros;
use crate::layout::LayoutParams;

/// Default content width of SVG output, in pixels
pub const DEFAULT_SVG_WIDTH: u32 = 1200;

/// Time zoom applied when opening the CPU detail view
pub const DETAIL_ZOOM_FACTOR: f64 = 8.0;

/// Geometry of bands, charts and labels
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Width of the time axis, excluding the label column
    pub width: f64,
    /// Left column reserved for titles and labels
    pub label_width: f64,
    pub band_height: f64,
    pub band_padding: f64,
    pub chart_height: f64,
    pub chart_padding: f64,
    pub title_height: f64,
    pub ruler_height: f64,
    pub separator_padding: f64,
    pub font_size: f64,
    /// Time zoom of the CPU detail view relative to the overview
    pub detail_zoom: f64,
    /// Minimum time-axis width of the CPU detail view
    pub detail_min_width: f64,
}

impl ViewConfig {
    /// Pixel geometry for SVG output
    #[must_use]
    pub fn svg(width: u32) -> Self {
        Self {
            width: f64::from(width),
            label_width: 160.0,
            band_height: 14.0,
            band_padding: 4.0,
            chart_height: 64.0,
            chart_padding: 8.0,
            title_height: 18.0,
            ruler_height: 20.0,
            separator_padding: 8.0,
            font_size: 11.0,
            detail_zoom: DETAIL_ZOOM_FACTOR,
            detail_min_width: 640.0,
        }
    }

    /// Cell geometry for a terminal `columns` wide
    #[must_use]
    pub fn terminal(columns: u16) -> Self {
        let label_width = 18.0;
        let width = (f64::from(columns) - label_width - 2.0).max(10.0);
        Self {
            width,
            label_width,
            band_height: 1.0,
            band_padding: 0.0,
            chart_height: 4.0,
            chart_padding: 1.0,
            title_height: 1.0,
            ruler_height: 1.0,
            separator_padding: 1.0,
            font_size: 1.0,
            detail_zoom: DETAIL_ZOOM_FACTOR,
            detail_min_width: width,
        }
    }

    /// Layout parameters mapping `[min, max]` onto the configured width
    #[must_use]
    pub fn layout_params(&self, min_timestamp: Micros, max_timestamp: Micros) -> LayoutParams {
        let span = (max_timestamp - min_timestamp).max(1) as f64;
        LayoutParams {
            min_timestamp,
            max_timestamp,
            resolution: span / self.width,
            label_width: self.label_width,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::svg(DEFAULT_SVG_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_params_resolution() {
        let config = ViewConfig::svg(1000);
        let params = config.layout_params(0, 50_000);
        assert!((params.resolution - 50.0).abs() < f64::EPSILON);
        assert!((params.label_width - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_window_does_not_divide_by_zero() {
        let params = ViewConfig::terminal(80).layout_params(10, 10);
        assert!(params.resolution > 0.0);
    }
}
