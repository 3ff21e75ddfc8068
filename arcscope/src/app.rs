//! Top-level view controller
//!
//! Owns the loaded model and everything derived from it: the overview layout,
//! the tooltip state and the CPU detail view. All state lives here; the
//! terminal UI and the headless CLI path both drive it through the same calls.
//!
//! ```text
//! set_model ──▶ teardown ──▶ build_overview
//! pointer_moved ──▶ detail overlay? ──▶ tooltip against detail or overview
//! click ──▶ outside overlay: close │ CPU band: open detail at timestamp
//! ```

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::detail::{DetailState, DetailedView};
use crate::domain::{ExportError, Micros, ModelError};
use crate::export::model_file;
use crate::interaction::{hit_test, HitTarget, InteractionController, Pointer, Tooltip};
use crate::layout::{BandLayout, BandRole};
use crate::overview::build_overview;
use crate::trace_model::TraceModel;

/// Narrowest window zooming can reach
pub const MIN_WINDOW_SPAN: Micros = 10;

/// Rectangle in overview coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

/// What a click changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    DetailOpened,
    DetailClosed,
}

pub struct App {
    config: ViewConfig,
    model: Option<Arc<TraceModel>>,
    window: (Micros, Micros),
    overview: Option<BandLayout>,
    interaction: InteractionController,
    detail: DetailState,
    overlay: Option<Area>,
}

impl App {
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            model: None,
            window: (0, 0),
            overview: None,
            interaction: InteractionController::new(),
            detail: DetailState::Closed,
            overlay: None,
        }
    }

    // ========================================================================
    // Model lifecycle
    // ========================================================================

    /// Replace the model, discarding every derived structure.
    pub fn set_model(&mut self, model: TraceModel) {
        self.detail.close();
        self.interaction.hide();
        self.overview = None;
        self.overlay = None;

        let model = Arc::new(model);
        self.window = (0, model.duration.max(1));
        self.model = Some(model);
        self.rebuild();
        info!("Model set, window [{}, {}]", self.window.0, self.window.1);
    }

    /// Load and set a model file.
    ///
    /// # Errors
    /// See [`TraceModel::from_file`]. The current model is kept on failure.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ModelError> {
        let model = model_file::load_model(path)?;
        self.set_model(model);
        Ok(())
    }

    /// Save the current model verbatim, returning the path written.
    ///
    /// # Errors
    /// Fails without a model or when the write fails.
    pub fn save_model(&self, requested: Option<&Path>) -> Result<PathBuf, ExportError> {
        let model = self.model.as_ref().ok_or(ExportError::NoModel)?;
        let path = model_file::save_path(requested);
        model_file::save_model(model, &path)?;
        Ok(path)
    }

    #[must_use]
    pub fn model(&self) -> Option<&Arc<TraceModel>> {
        self.model.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Change geometry (e.g. after a terminal resize) and rebuild.
    pub fn set_config(&mut self, config: ViewConfig) {
        if config != self.config {
            self.config = config;
            self.detail.close();
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        self.interaction.hide();
        self.overview = self.model.as_ref().map(|model| {
            let params = self.config.layout_params(self.window.0, self.window.1);
            build_overview(model, params, &self.config)
        });
    }

    // ========================================================================
    // Window
    // ========================================================================

    #[must_use]
    pub fn window(&self) -> (Micros, Micros) {
        self.window
    }

    /// Show `[min, max]` in the overview.
    pub fn set_window(&mut self, min: Micros, max: Micros) {
        let max = max.max(min + MIN_WINDOW_SPAN);
        if (min, max) != self.window {
            debug!("Window [{min}, {max}]");
            self.window = (min, max);
            self.rebuild();
        }
    }

    /// Zoom by `factor` (> 1 zooms in) keeping `center` fixed.
    pub fn zoom(&mut self, factor: f64, center: Micros) {
        let (min, max) = self.window;
        let scale = 1.0 / factor;
        let new_min = center - ((center - min) as f64 * scale).round() as Micros;
        let new_max = center + ((max - center) as f64 * scale).round() as Micros;
        if new_max - new_min >= MIN_WINDOW_SPAN {
            self.set_window(new_min, new_max);
        }
    }

    /// Shift the window by `fraction` of its span.
    pub fn pan(&mut self, fraction: f64) {
        let (min, max) = self.window;
        let shift = ((max - min) as f64 * fraction).round() as Micros;
        self.set_window(min + shift, max + shift);
    }

    fn window_center(&self) -> Micros {
        self.window.0 + (self.window.1 - self.window.0) / 2
    }

    // ========================================================================
    // Views
    // ========================================================================

    #[must_use]
    pub fn overview(&self) -> Option<&BandLayout> {
        self.overview.as_ref()
    }

    #[must_use]
    pub fn detail(&self) -> Option<&DetailedView> {
        self.detail.view()
    }

    /// Where the detail view is drawn over the overview
    pub fn set_overlay_area(&mut self, area: Area) {
        self.overlay = Some(area);
    }

    /// Overlay area of the open detail view; its own size at the origin by default
    #[must_use]
    pub fn overlay_area(&self) -> Option<Area> {
        let view = self.detail.view()?;
        Some(self.overlay.unwrap_or(Area {
            x: 0.0,
            y: 0.0,
            width: view.layout().width(),
            height: view.layout().height(),
        }))
    }

    /// Open the CPU detail view centered on `timestamp`, replacing any open one.
    pub fn open_detail(&mut self, timestamp: Micros, core: Option<usize>) -> bool {
        let (Some(model), Some(overview)) = (self.model.as_ref(), self.overview.as_ref()) else {
            return false;
        };
        let view = DetailedView::build(model, overview.params(), &self.config, timestamp, core);
        self.detail.open(view);
        self.interaction.hide();
        true
    }

    pub fn close_detail(&mut self) {
        if self.detail.is_open() {
            debug!("Closing CPU detail");
            self.detail.close();
            self.interaction.hide();
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    #[must_use]
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.interaction.tooltip()
    }

    /// Update the tooltip for a pointer in overview coordinates.
    pub fn pointer_moved(&mut self, pointer: Pointer) -> Option<&Tooltip> {
        if let (Some(area), Some(view)) = (self.overlay_area(), self.detail.view()) {
            if area.contains(pointer.x, pointer.y) {
                let local = Pointer { x: pointer.x - area.x, y: pointer.y - area.y, ..pointer };
                return self.interaction.pointer_moved(view.layout(), local);
            }
            self.interaction.hide();
            return None;
        }
        match &self.overview {
            Some(layout) => self.interaction.pointer_moved(layout, pointer),
            None => {
                self.interaction.hide();
                None
            }
        }
    }

    /// Click at `pointer` in overview coordinates.
    pub fn click(&mut self, pointer: Pointer) -> ClickOutcome {
        if let Some(area) = self.overlay_area() {
            if area.contains(pointer.x, pointer.y) {
                return ClickOutcome::Ignored;
            }
            self.close_detail();
            return ClickOutcome::DetailClosed;
        }

        let Some(layout) = &self.overview else {
            return ClickOutcome::Ignored;
        };
        if !layout.contains_x(pointer.x) {
            return ClickOutcome::Ignored;
        }
        let Some(HitTarget::Band(index)) = hit_test(layout, pointer.y) else {
            return ClickOutcome::Ignored;
        };
        let BandRole::Cpu(core) = layout.bands()[index].role else {
            return ClickOutcome::Ignored;
        };
        let timestamp = layout.timestamp_at(pointer.x);
        if self.open_detail(timestamp, Some(core)) {
            ClickOutcome::DetailOpened
        } else {
            ClickOutcome::Ignored
        }
    }

    /// Handle a key; returns whether anything changed.
    pub fn key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape | Key::Enter => {
                let open = self.detail.is_open();
                self.close_detail();
                open
            }
            Key::ZoomIn => {
                self.zoom(2.0, self.window_center());
                true
            }
            Key::ZoomOut => {
                self.zoom(0.5, self.window_center());
                true
            }
            Key::PanLeft => {
                self.pan(-0.25);
                true
            }
            Key::PanRight => {
                self.pan(0.25);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "duration": 1000,
        "system": {
            "cpu": [[[1, 100, 42], [0, 600]]],
            "threads": {"42": {"pid": 42, "name": "surfaceflinger"}}
        },
        "chrome": {"buffers": [[[500, 100], [501, 200], [504, 300]]]}
    }"#;

    fn app() -> App {
        let mut app = App::new(ViewConfig::svg(1000));
        app.set_model(TraceModel::from_json_str(MODEL).unwrap());
        app
    }

    /// Pointer over the first CPU band at `ts`
    fn on_cpu(app: &App, ts: Micros) -> Pointer {
        let layout = app.overview().unwrap();
        let band = &layout.bands()[0];
        Pointer::at(layout.x_for(ts), band.top)
    }

    #[test]
    fn test_click_cpu_band_opens_detail() {
        let mut app = app();
        let pointer = on_cpu(&app, 300);
        assert_eq!(app.click(pointer), ClickOutcome::DetailOpened);

        let view = app.detail().unwrap();
        assert_eq!(view.center, 300);
        assert_eq!(view.core, Some(0));
        assert_eq!(view.processes[0].name, "surfaceflinger");
    }

    #[test]
    fn test_click_other_band_is_ignored() {
        let mut app = app();
        let layout = app.overview().unwrap();
        let chrome = &layout.bands()[1];
        let pointer = Pointer::at(layout.x_for(150), chrome.top);
        assert_eq!(app.click(pointer), ClickOutcome::Ignored);
        assert!(app.detail().is_none());
    }

    #[test]
    fn test_detail_closes_on_keys_and_outside_click() {
        let mut app = app();
        app.open_detail(300, Some(0));
        assert!(app.key(Key::Escape));
        assert!(app.detail().is_none());
        assert!(!app.key(Key::Enter), "nothing left to close");

        app.open_detail(300, Some(0));
        app.set_overlay_area(Area { x: 100.0, y: 100.0, width: 50.0, height: 50.0 });
        assert_eq!(app.click(Pointer::at(120.0, 120.0)), ClickOutcome::Ignored);
        assert!(app.detail().is_some());
        assert_eq!(app.click(Pointer::at(10.0, 10.0)), ClickOutcome::DetailClosed);
        assert!(app.detail().is_none());
    }

    #[test]
    fn test_set_model_tears_down() {
        let mut app = app();
        app.open_detail(300, Some(0));
        app.pointer_moved(on_cpu(&app, 300));
        app.set_model(TraceModel::from_json_str(r#"{"duration": 50}"#).unwrap());

        assert!(app.detail().is_none());
        assert!(app.tooltip().is_none());
        assert_eq!(app.window(), (0, 50));
        assert!(app.overview().unwrap().bands().is_empty());
    }

    #[test]
    fn test_pointer_over_cpu_band() {
        let mut app = app();
        let tooltip = app.pointer_moved(on_cpu(&app, 300)).unwrap();
        assert!(tooltip.lines().iter().any(|l| l.starts_with("active")));
    }

    #[test]
    fn test_zoom_and_pan() {
        let mut app = app();
        app.key(Key::ZoomIn);
        assert_eq!(app.window(), (250, 750));
        app.key(Key::PanRight);
        assert_eq!(app.window(), (375, 875));
        app.key(Key::ZoomOut);
        assert_eq!(app.window(), (125, 1125));
    }

    #[test]
    fn test_save_without_model() {
        let app = App::new(ViewConfig::default());
        assert!(matches!(app.save_model(None), Err(ExportError::NoModel)));
    }
}
