//! TUI color theme
//!
//! HUD colors for chrome (header, status bar, popups) and a light canvas so
//! band colors and dark labels read the same as in SVG output.

use arcscope_common::Rgb;
use ratatui::style::Color;

// HUD color scheme
pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);
pub const BACKGROUND: Color = Color::Rgb(0, 20, 0);

/// Behind bands and charts
pub const CANVAS_BACKGROUND: Color = Color::Rgb(250, 250, 250);

#[must_use]
pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Get severity color for a CPU share of the window
/// - Above 40%: Critical (Red)
/// - Above 20%: Caution (Amber)
/// - Otherwise: Normal (Green)
#[must_use]
pub fn severity_color(percentage: f64) -> Color {
    if percentage > 40.0 {
        CRITICAL_RED
    } else if percentage > 20.0 {
        CAUTION_AMBER
    } else {
        HUD_GREEN
    }
}
