//! Band layout engine
//!
//! Stacks bands, charts, titles and separators top to bottom over a shared
//! time → x mapping and records what it draws into a scene:
//!
//! ```text
//! x(ts) = label_width + (ts - min_timestamp) / resolution     resolution = µs per unit
//!
//! ┌ label column ┐┌──────────────── time axis ────────────────┐
//! │ CPU 0        ││██████    ███████████        ███           │  band
//! │ Memory       ││     ╱╲___╱╲_____                          │  chart
//! │──────────────││───────────────────────────────────────────│  separator
//! └──────────────┘└───────────────────────────────────────────┘
//!             global markers span the full height at render time
//! ```
//!
//! # Band Painting
//!
//! Walking a series forward from the window start, each event closes the span
//! in progress (if any) and then either opens a new span in its own color or,
//! when it ends a sequence, leaves the band unpainted until the next event.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use arcscope_common::{EventAttributes, Rgb};
use log::{debug, warn};

use crate::domain::{Micros, Tid};
use crate::sequence::SequenceClassifier;
use crate::series::EventSeries;
use crate::surface::{Point, RecordingSurface, Surface};

/// Divider and ruler color
pub const SEPARATOR_COLOR: Rgb = Rgb(0xcc, 0xcc, 0xcc);
/// Title and label color
pub const TEXT_COLOR: Rgb = Rgb(0x20, 0x20, 0x20);

/// Time window and scale of a layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub min_timestamp: Micros,
    pub max_timestamp: Micros,
    /// Microseconds per layout unit
    pub resolution: f64,
    /// Width reserved left of the time axis
    pub label_width: f64,
}

impl LayoutParams {
    /// Width of the time axis
    #[must_use]
    pub fn content_width(&self) -> f64 {
        (self.max_timestamp - self.min_timestamp) as f64 / self.resolution
    }
}

/// What a band shows, for click handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandRole {
    Plain,
    /// Activity of one CPU core
    Cpu(usize),
    /// Scheduling of one thread in the detail view
    Thread(Tid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartId(pub usize);

#[derive(Debug, Clone)]
pub struct BandRecord {
    pub series: EventSeries,
    pub top: f64,
    pub bottom: f64,
    pub role: BandRole,
}

/// One plotted value series and the value axis it was drawn with
#[derive(Debug, Clone)]
pub struct ChartSource {
    pub attributes: EventAttributes,
    pub min_value: f64,
    pub max_value: f64,
    pub series: EventSeries,
}

#[derive(Debug, Clone)]
pub struct ChartRecord {
    pub sources: Vec<ChartSource>,
    pub top: f64,
    pub bottom: f64,
}

/// Pixel-space layout of bands and charts plus the scene drawn for them
#[derive(Debug, Clone)]
pub struct BandLayout {
    params: LayoutParams,
    classifier: SequenceClassifier,
    next_offset: f64,
    bands: Vec<BandRecord>,
    charts: Vec<ChartRecord>,
    globals: Vec<EventSeries>,
    vsync: Option<EventSeries>,
    scene: RecordingSurface,
    font_size: f64,
}

impl BandLayout {
    #[must_use]
    pub fn new(params: LayoutParams, classifier: SequenceClassifier) -> Self {
        Self {
            params,
            classifier,
            next_offset: 0.0,
            bands: Vec::new(),
            charts: Vec::new(),
            globals: Vec::new(),
            vsync: None,
            scene: RecordingSurface::new(),
            font_size: 11.0,
        }
    }

    /// Text size used for titles, labels and ruler marks
    #[must_use]
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    #[must_use]
    pub fn classifier(&self) -> &SequenceClassifier {
        &self.classifier
    }

    /// x position of `timestamp`
    #[must_use]
    pub fn x_for(&self, timestamp: Micros) -> f64 {
        self.params.label_width + (timestamp - self.params.min_timestamp) as f64 / self.params.resolution
    }

    /// Timestamp under `x` (inverse of [`BandLayout::x_for`])
    #[must_use]
    pub fn timestamp_at(&self, x: f64) -> Micros {
        self.params.min_timestamp + ((x - self.params.label_width) * self.params.resolution).round() as Micros
    }

    /// Whether `x` lies on the time axis
    #[must_use]
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.params.label_width && x <= self.width()
    }

    /// Total height of everything added so far
    #[must_use]
    pub fn height(&self) -> f64 {
        self.next_offset
    }

    /// Label column plus time axis
    #[must_use]
    pub fn width(&self) -> f64 {
        self.params.label_width + self.params.content_width()
    }

    #[must_use]
    pub fn bands(&self) -> &[BandRecord] {
        &self.bands
    }

    #[must_use]
    pub fn charts(&self) -> &[ChartRecord] {
        &self.charts
    }

    #[must_use]
    pub fn globals(&self) -> &[EventSeries] {
        &self.globals
    }

    #[must_use]
    pub fn vsync(&self) -> Option<&EventSeries> {
        self.vsync.as_ref()
    }

    /// Band and chart content drawn so far, without global markers
    #[must_use]
    pub fn scene(&self) -> &RecordingSurface {
        &self.scene
    }

    /// Add a band painting `series` as contiguous colored spans.
    pub fn add_band(&mut self, series: EventSeries, height: f64, padding: f64) -> BandId {
        self.add_band_with_role(series, height, padding, BandRole::Plain)
    }

    /// [`BandLayout::add_band`] with a role used for click handling.
    pub fn add_band_with_role(
        &mut self,
        series: EventSeries,
        height: f64,
        padding: f64,
        role: BandRole,
    ) -> BandId {
        let top = self.next_offset;
        let right = self.x_for(self.params.max_timestamp);

        // None: not painting. Some(color): a span is open since `last_x`.
        let mut current: Option<Rgb> = None;
        let mut last_x = 0.0;
        let mut spans = 0usize;

        for index in series.matching_from(series.first_at_or_after(self.params.min_timestamp)) {
            let event = series.event(index);
            if event.timestamp >= self.params.max_timestamp {
                break;
            }
            let x = self.x_for(event.timestamp);
            if let Some(color) = current {
                if x > last_x {
                    self.scene.draw_rect(last_x, top, x - last_x, height, color);
                    spans += 1;
                }
            }
            let attributes = event.kind.attributes();
            current = if attributes.unused || self.classifier.is_sequence_end(&series, index) {
                None
            } else {
                Some(attributes.color)
            };
            last_x = x;
        }

        if let Some(color) = current {
            if right > last_x {
                self.scene.draw_rect(last_x, top, right - last_x, height, color);
                spans += 1;
            }
        }

        debug!("Band at {top}: {spans} spans");
        self.bands.push(BandRecord { series, top, bottom: top + height, role });
        self.next_offset += height + padding;
        BandId(self.bands.len() - 1)
    }

    /// Reserve a chart strip; fill it with [`BandLayout::add_chart_sources`].
    pub fn add_chart(&mut self, height: f64, padding: f64) -> ChartId {
        let top = self.next_offset;
        let bottom = top + height;
        self.scene.draw_line(
            Point::new(self.params.label_width, bottom),
            Point::new(self.width(), bottom),
            SEPARATOR_COLOR,
            0.5,
        );
        self.charts.push(ChartRecord { sources: Vec::new(), top, bottom });
        self.next_offset += height + padding;
        ChartId(self.charts.len() - 1)
    }

    /// Plot `series_list` into `chart` on one shared value axis.
    ///
    /// The axis covers all in-window samples of all sources, inflated by 1% on
    /// each side. A constant signal gets a unit range centered on its value so
    /// it renders as a flat line at mid-height.
    ///
    /// # Panics
    /// Panics if `chart` was not returned by this layout.
    pub fn add_chart_sources(&mut self, chart: ChartId, series_list: Vec<EventSeries>) {
        let (min_ts, max_ts) = (self.params.min_timestamp, self.params.max_timestamp);

        let mut bounds: Option<(f64, f64)> = None;
        for series in &series_list {
            for index in series.window_indices(min_ts, max_ts) {
                if let Some(v) = series.event(index).number() {
                    bounds = Some(bounds.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))));
                }
            }
        }
        let Some((lo, hi)) = bounds else {
            warn!("Chart {} has no samples in view", chart.0);
            return;
        };
        let (min_value, max_value) = if hi > lo {
            let pad = (hi - lo) * 0.01;
            (lo - pad, hi + pad)
        } else {
            (lo - 0.5, hi + 0.5)
        };

        let (top, bottom) = (self.charts[chart.0].top, self.charts[chart.0].bottom);
        let height = bottom - top;

        for series in series_list {
            let mut attributes = None;
            let points: Vec<Point> = series
                .window_indices(min_ts, max_ts)
                .filter_map(|index| {
                    let event = series.event(index);
                    let value = event.number()?;
                    attributes.get_or_insert(event.kind.attributes());
                    let y = bottom - (value - min_value) / (max_value - min_value) * height;
                    Some(Point::new(self.x_for(event.timestamp), y))
                })
                .collect();
            let Some(attributes) = attributes else {
                continue;
            };
            self.scene.draw_polyline(&points, attributes.color, 1.0);
            self.charts[chart.0].sources.push(ChartSource { attributes, min_value, max_value, series });
        }
    }

    /// Register marks drawn as full-height lines at every matching event.
    pub fn add_global(&mut self, series: EventSeries) {
        self.globals.push(series);
    }

    /// [`BandLayout::add_global`], also used for "since last vsync" queries.
    pub fn set_vsync(&mut self, series: EventSeries) {
        self.add_global(series.clone());
        self.vsync = Some(series);
    }

    /// Advance by `padding`, drawing a thin divider across the middle.
    pub fn add_band_separator(&mut self, padding: f64) {
        let y = self.next_offset + padding / 2.0;
        self.scene.draw_line(Point::new(0.0, y), Point::new(self.width(), y), SEPARATOR_COLOR, 0.5);
        self.next_offset += padding;
    }

    /// Section title in the label column, on its own row.
    pub fn add_title(&mut self, text: &str, height: f64) {
        self.scene.draw_text(Point::new(0.0, self.next_offset), text, TEXT_COLOR, self.font_size);
        self.next_offset += height;
    }

    /// Label for the next band or chart; does not advance.
    pub fn add_label(&mut self, text: &str) {
        self.scene.draw_text(Point::new(0.0, self.next_offset), text, TEXT_COLOR, self.font_size);
    }

    /// Tick marks every `step` microseconds, labelled in milliseconds.
    pub fn add_time_ruler(&mut self, height: f64, step: Micros) {
        let top = self.next_offset;
        let step = step.max(1);
        let first = self.params.min_timestamp.div_euclid(step) * step;
        let mut tick = if first < self.params.min_timestamp { first + step } else { first };
        while tick <= self.params.max_timestamp {
            let x = self.x_for(tick);
            self.scene.draw_line(Point::new(x, top), Point::new(x, top + height), SEPARATOR_COLOR, 0.5);
            self.scene.draw_text(
                Point::new(x + 1.0, top),
                &format_ms(tick),
                TEXT_COLOR,
                self.font_size,
            );
            tick += step;
        }
        self.next_offset += height;
    }

    /// Replay the scene onto `surface`, then draw global markers full height.
    pub fn render(&self, surface: &mut dyn Surface) {
        self.scene.replay(surface);
        let height = self.height();
        for series in &self.globals {
            for index in series.window_indices(self.params.min_timestamp, self.params.max_timestamp) {
                let event = series.event(index);
                let attributes = event.kind.attributes();
                let x = self.x_for(event.timestamp);
                surface.draw_line(Point::new(x, 0.0), Point::new(x, height), attributes.color, attributes.width);
                if let Some(radius) = attributes.radius {
                    surface.draw_circle(Point::new(x, radius), radius, attributes.color);
                }
            }
        }
    }
}

/// Format microseconds as milliseconds, e.g. `12.345ms`
#[must_use]
pub fn format_ms(micros: Micros) -> String {
    format!("{:.3}ms", micros as f64 / 1000.0)
}

/// Ruler step giving roughly `ticks` marks over `span` microseconds
#[must_use]
pub fn ruler_step(span: Micros, ticks: u32) -> Micros {
    let raw = (span.max(1) as f64 / f64::from(ticks.max(1))).max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    let nice = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);
    nice as Micros
}
