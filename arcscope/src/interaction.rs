//! Pointer queries against a built layout
//!
//! Maps a pointer position to a timestamp and a band or chart, then assembles
//! the tooltip for it. Tooltip state is rebuilt on every move and never kept
//! beyond the next one.
//!
//! # Band Tooltips
//!
//! 1. A global mark within [`GLOBAL_EVENT_TOLERANCE`] of the cursor wins.
//! 2. Otherwise, if the cursor sits in an idle span, the idle interval.
//! 3. Otherwise the whole sequence around the cursor, one step per stage.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]

use arcscope_common::Rgb;

use crate::domain::Micros;
use crate::layout::{format_ms, BandLayout};
use crate::series::{Direction, EventSeries};

/// Maximum distance between cursor and a global mark for it to take priority
pub const GLOBAL_EVENT_TOLERANCE: Micros = 200;

/// Pointer position in layout space plus where to anchor the tooltip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    pub client_x: f64,
    pub client_y: f64,
}

impl Pointer {
    /// Pointer whose client position equals its layout position
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x, y, client_x: x, client_y: y }
    }
}

/// Row under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Band(usize),
    Chart(usize),
}

/// One stage of a sequence walk
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStep {
    pub name: &'static str,
    pub timestamp: Micros,
    /// Time until the next stage, `None` for the last one
    pub elapsed: Option<Micros>,
    pub next: Option<&'static str>,
}

/// Interpolated value of one chart source
#[derive(Debug, Clone, PartialEq)]
pub struct ChartValue {
    pub name: &'static str,
    pub color: Rgb,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TooltipContent {
    /// A global mark near the cursor
    Global { name: &'static str, timestamp: Micros, value: Option<String> },
    /// Nothing in progress between `start` and `end`
    Idle { start: Option<Micros>, end: Option<Micros> },
    Sequence(Vec<SequenceStep>),
    Chart(Vec<ChartValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub client_x: f64,
    pub client_y: f64,
    /// Timestamp under the cursor
    pub timestamp: Micros,
    pub target: HitTarget,
    pub content: TooltipContent,
    /// Time since the last vsync at or before the cursor
    pub since_vsync: Option<Micros>,
}

impl Tooltip {
    /// Plain text rendering, one entry per line
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("at {}", format_ms(self.timestamp))];
        match &self.content {
            TooltipContent::Global { name, timestamp, value } => {
                let mut line = format!("{name} at {}", format_ms(*timestamp));
                if let Some(value) = value {
                    line.push_str(&format!(": {value}"));
                }
                lines.push(line);
            }
            TooltipContent::Idle { start, end } => {
                let bound = |ts: &Option<Micros>| ts.map_or_else(|| "?".to_string(), format_ms);
                lines.push(format!("idle [{}, {})", bound(start), bound(end)));
            }
            TooltipContent::Sequence(steps) => {
                for step in steps {
                    match (step.elapsed, step.next) {
                        (Some(elapsed), Some(next)) => {
                            lines.push(format!("{} {} -> {next}", step.name, format_ms(elapsed)));
                        }
                        _ => lines.push(step.name.to_string()),
                    }
                }
            }
            TooltipContent::Chart(values) => {
                for value in values {
                    lines.push(format!("{}: {:.2}", value.name, value.value));
                }
            }
        }
        if let Some(since) = self.since_vsync {
            lines.push(format!("since vsync {}", format_ms(since)));
        }
        lines
    }
}

/// Keeps the tooltip for the current pointer position
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    tooltip: Option<Tooltip>,
}

impl InteractionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the tooltip for `pointer`; `None` hides it.
    pub fn pointer_moved(&mut self, layout: &BandLayout, pointer: Pointer) -> Option<&Tooltip> {
        self.tooltip = build_tooltip(layout, pointer);
        self.tooltip.as_ref()
    }

    pub fn hide(&mut self) {
        self.tooltip = None;
    }

    #[must_use]
    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }
}

/// Band or chart whose vertical range contains `y`
#[must_use]
pub fn hit_test(layout: &BandLayout, y: f64) -> Option<HitTarget> {
    if let Some(index) = layout.bands().iter().position(|b| y >= b.top && y < b.bottom) {
        return Some(HitTarget::Band(index));
    }
    layout
        .charts()
        .iter()
        .position(|c| y >= c.top && y < c.bottom)
        .map(HitTarget::Chart)
}

/// Tooltip for `pointer`, or `None` outside every band, chart and the time axis
#[must_use]
pub fn build_tooltip(layout: &BandLayout, pointer: Pointer) -> Option<Tooltip> {
    if !layout.contains_x(pointer.x) {
        return None;
    }
    let timestamp = layout.timestamp_at(pointer.x);
    let target = hit_test(layout, pointer.y)?;

    let content = match target {
        HitTarget::Band(index) => band_content(layout, &layout.bands()[index].series, timestamp),
        HitTarget::Chart(index) => {
            let values: Vec<ChartValue> = layout.charts()[index]
                .sources
                .iter()
                .filter_map(|source| {
                    Some(ChartValue {
                        name: source.attributes.name,
                        color: source.attributes.color,
                        value: interpolate(&source.series, timestamp)?,
                    })
                })
                .collect();
            if values.is_empty() {
                return None;
            }
            TooltipContent::Chart(values)
        }
    };

    let since_vsync = layout.vsync().and_then(|vsync| {
        vsync.last_at_or_before(timestamp).map(|index| timestamp - vsync.event(index).timestamp)
    });

    Some(Tooltip {
        client_x: pointer.client_x,
        client_y: pointer.client_y,
        timestamp,
        target,
        content,
        since_vsync,
    })
}

fn band_content(layout: &BandLayout, series: &EventSeries, timestamp: Micros) -> TooltipContent {
    let hovered = series.nearest_index(timestamp);
    if let Some(content) = nearest_global(layout, series, hovered, timestamp) {
        return content;
    }

    let classifier = layout.classifier();
    let current = series.last_at_or_before(timestamp);
    match current {
        Some(index) if !classifier.is_sequence_end(series, index) => {
            let start = classifier.sequence_start(series, index);
            let indices = classifier.sequence_from(series, start);
            let steps = indices
                .iter()
                .enumerate()
                .map(|(n, &i)| {
                    let event = series.event(i);
                    let next = indices.get(n + 1).map(|&j| series.event(j));
                    SequenceStep {
                        name: event.kind.attributes().name,
                        timestamp: event.timestamp,
                        elapsed: next.map(|e| e.timestamp - event.timestamp),
                        next: next.map(|e| e.kind.attributes().name),
                    }
                })
                .collect();
            TooltipContent::Sequence(steps)
        }
        _ => {
            let start = current.map(|i| series.event(i).timestamp);
            let from = current.map_or(-1, |i| i as isize);
            let end = series
                .next_matching_index(from, Direction::Forward)
                .map(|i| series.event(i).timestamp);
            TooltipContent::Idle { start, end }
        }
    }
}

/// Closest global mark within tolerance, skipping the hovered band event itself.
fn nearest_global(
    layout: &BandLayout,
    band: &EventSeries,
    hovered: Option<usize>,
    timestamp: Micros,
) -> Option<TooltipContent> {
    let hovered_event = hovered.map(|i| band.event(i));
    let mut best: Option<(Micros, &EventSeries, usize)> = None;

    for global in layout.globals() {
        let window = global.window_indices(timestamp - GLOBAL_EVENT_TOLERANCE, timestamp + GLOBAL_EVENT_TOLERANCE);
        for index in window {
            let event = global.event(index);
            let same_slot = global.shares_events(band) && hovered == Some(index);
            let same_event = hovered_event
                .is_some_and(|h| h.kind == event.kind && h.timestamp == event.timestamp);
            if same_slot || same_event {
                continue;
            }
            let distance = (event.timestamp - timestamp).abs();
            if best.map_or(true, |(d, _, _)| distance < d) {
                best = Some((distance, global, index));
            }
        }
    }

    best.map(|(_, series, index)| {
        let event = series.event(index);
        TooltipContent::Global {
            name: event.kind.attributes().name,
            timestamp: event.timestamp,
            value: event.value_text(),
        }
    })
}

/// Value of `series` at `timestamp`, linear between the bracketing samples.
///
/// Returns the sample itself on an exact hit and `None` without a pair.
#[must_use]
pub fn interpolate(series: &EventSeries, timestamp: Micros) -> Option<f64> {
    let after = series.first_at_or_after(timestamp)?;
    let after_event = series.event(after);
    if after_event.timestamp == timestamp {
        return after_event.number();
    }
    let before = series.next_matching_index(after as isize, Direction::Backward)?;
    let before_event = series.event(before);
    let (v0, v1) = (before_event.number()?, after_event.number()?);
    let span = (after_event.timestamp - before_event.timestamp) as f64;
    if span <= 0.0 {
        return Some(v1);
    }
    let t = (timestamp - before_event.timestamp) as f64 / span;
    Some(v0 + (v1 - v0) * t)
}
