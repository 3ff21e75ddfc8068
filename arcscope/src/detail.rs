//! CPU detail view
//!
//! Clicking a CPU band opens a time-zoomed view around the click showing which
//! threads ran, grouped by process. Per-thread activity is reconstructed from
//! the per-core stream, where `IdleOut` carries the scheduled thread id and
//! `IdleIn` (or a zero id) means the core went idle:
//!
//! ```text
//! core 0:  IdleOut(10)@100  IdleOut(11)@300  IdleIn@500
//!              ↓ per thread, clipped to the window
//! tid 10:  [IdleOut@100, IdleIn@300]
//! tid 11:  [IdleOut@300, IdleIn@500]
//! ```
//!
//! The view is derived on demand and discarded on close; nothing is updated
//! incrementally.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use arcscope_common::{EventKind, CPU_RANGE};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::domain::{Micros, Pid, Tid};
use crate::layout::{format_ms, ruler_step, BandLayout, BandRole, LayoutParams};
use crate::sequence::SequenceClassifier;
use crate::series::EventSeries;
use crate::trace_model::{Event, TraceModel};

/// Zoom relative to the parent layout and minimum axis width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailParams {
    pub zoom_factor: f64,
    pub min_width: f64,
}

impl DetailParams {
    #[must_use]
    pub fn from_config(config: &ViewConfig) -> Self {
        Self { zoom_factor: config.detail_zoom, min_width: config.detail_min_width }
    }

    /// Window `[min, max]` centered on `center` for a parent layout.
    #[must_use]
    pub fn window(&self, parent: &LayoutParams, center: Micros) -> (Micros, Micros) {
        let width = parent.content_width().max(self.min_width);
        let half = (width * parent.resolution / self.zoom_factor / 2.0).round() as Micros;
        (center - half, center + half)
    }
}

/// Scheduling of one thread inside the window
#[derive(Debug, Clone)]
pub struct ThreadActivity {
    pub tid: Tid,
    pub name: String,
    /// Time scheduled on any core
    pub total: Micros,
    /// Synthesized `IdleOut`/`IdleIn` pairs, time-ascending
    pub events: Arc<[Event]>,
}

#[derive(Debug, Clone)]
pub struct ProcessActivity {
    pub pid: Pid,
    pub name: String,
    pub total: Micros,
    pub threads: Vec<ThreadActivity>,
}

/// Synthesized intervals and scheduled time of one thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadIntervals {
    pub events: Vec<Event>,
    pub total: Micros,
}

impl ThreadIntervals {
    fn push(&mut self, tid: Tid, start: Micros, end: Micros) {
        if end <= start {
            return;
        }
        self.events.push(Event::new(EventKind::IdleOut, start).with_value(f64::from(tid.0)));
        self.events.push(Event::new(EventKind::IdleIn, end));
        self.total += end - start;
    }
}

/// Thread scheduled by a CPU event, `None` when the core goes idle
fn scheduled_thread(event: &Event) -> Option<Tid> {
    match event.kind {
        EventKind::IdleOut => event.number().map(|v| Tid(v as u32)).filter(|t| !t.is_idle()),
        _ => None,
    }
}

/// Per-thread intervals across all cores, clipped to `[min, max]`.
#[must_use]
pub fn reconstruct_threads(
    cores: &[Arc<[Event]>],
    min: Micros,
    max: Micros,
) -> BTreeMap<Tid, ThreadIntervals> {
    let mut threads: BTreeMap<Tid, ThreadIntervals> = BTreeMap::new();

    for events in cores {
        let series = EventSeries::with_range(Arc::clone(events), CPU_RANGE);

        let mut active: Option<(Tid, Micros)> = series
            .last_at_or_before(min)
            .and_then(|i| scheduled_thread(series.event(i)))
            .map(|tid| (tid, min));

        for index in series.matching_from(series.first_at_or_after(min)) {
            let event = series.event(index);
            if event.timestamp > max {
                break;
            }
            let next = scheduled_thread(event);
            if next == active.map(|(tid, _)| tid) {
                continue;
            }
            if let Some((tid, since)) = active.take() {
                threads.entry(tid).or_default().push(tid, since, event.timestamp);
            }
            active = next.map(|tid| (tid, event.timestamp));
        }

        if let Some((tid, since)) = active {
            threads.entry(tid).or_default().push(tid, since, max);
        }
    }

    // Migrations between cores can interleave; IdleIn sorts first on ties.
    for intervals in threads.values_mut() {
        intervals.events.sort_by_key(|e| (e.timestamp, e.code()));
    }
    threads
}

/// Group threads by owning process, busiest first.
#[must_use]
pub fn group_by_process(model: &TraceModel, threads: BTreeMap<Tid, ThreadIntervals>) -> Vec<ProcessActivity> {
    let mut processes: BTreeMap<Pid, Vec<ThreadActivity>> = BTreeMap::new();

    for (tid, intervals) in threads {
        let (pid, name) = match model.thread(tid) {
            Some(info) => (info.pid, info.name.clone()),
            None => {
                warn!("No name for {tid}, grouping under unknown process");
                (Pid(0), format!("tid {}", tid.0))
            }
        };
        processes.entry(pid).or_default().push(ThreadActivity {
            tid,
            name,
            total: intervals.total,
            events: Arc::from(intervals.events),
        });
    }

    let mut result: Vec<ProcessActivity> = processes
        .into_iter()
        .map(|(pid, mut threads)| {
            threads.sort_by(|a, b| b.total.cmp(&a.total).then(a.tid.cmp(&b.tid)));
            let name = process_name(model, pid);
            ProcessActivity { pid, name, total: threads.iter().map(|t| t.total).sum(), threads }
        })
        .collect();
    result.sort_by(|a, b| b.total.cmp(&a.total).then(a.pid.cmp(&b.pid)));
    result
}

fn process_name(model: &TraceModel, pid: Pid) -> String {
    if pid.0 == 0 {
        return "unknown".to_string();
    }
    model
        .thread(Tid(pid.0))
        .filter(|info| info.pid == pid)
        .map_or_else(|| format!("pid {}", pid.0), |info| info.name.clone())
}

/// Zoomed per-thread view around one timestamp
#[derive(Debug, Clone)]
pub struct DetailedView {
    pub center: Micros,
    /// Core whose band was clicked, if opened from one
    pub core: Option<usize>,
    pub processes: Vec<ProcessActivity>,
    layout: BandLayout,
}

impl DetailedView {
    /// Reconstruct threads around `center` and lay them out at the zoomed scale.
    #[must_use]
    pub fn build(
        model: &TraceModel,
        parent: &LayoutParams,
        config: &ViewConfig,
        center: Micros,
        core: Option<usize>,
    ) -> Self {
        let params = DetailParams::from_config(config);
        let (min, max) = params.window(parent, center);
        let threads = reconstruct_threads(&model.system.cpu, min, max);
        let processes = group_by_process(model, threads);

        let layout_params = LayoutParams {
            min_timestamp: min,
            max_timestamp: max,
            resolution: parent.resolution / params.zoom_factor,
            label_width: parent.label_width,
        };
        let mut layout =
            BandLayout::new(layout_params, SequenceClassifier::default()).with_font_size(config.font_size);

        let span = (max - min).max(1);
        let percent = |total: Micros| total as f64 * 100.0 / span as f64;

        layout.add_title(&format!("CPU detail at {}", format_ms(center)), config.title_height);
        layout.add_time_ruler(config.ruler_height, ruler_step(span, 8));
        for process in &processes {
            layout.add_band_separator(config.separator_padding);
            layout.add_title(&format!("{} {:.1}%", process.name, percent(process.total)), config.title_height);
            for thread in &process.threads {
                layout.add_label(&format!("{} {:.1}%", thread.name, percent(thread.total)));
                layout.add_band_with_role(
                    EventSeries::with_range(Arc::clone(&thread.events), CPU_RANGE),
                    config.band_height,
                    config.band_padding,
                    BandRole::Thread(thread.tid),
                );
            }
        }

        info!(
            "Opened CPU detail at {center}us: {} processes over [{min}, {max}]",
            processes.len()
        );
        debug!("Detail layout {}x{}", layout.width(), layout.height());
        Self { center, core, processes, layout }
    }

    #[must_use]
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }
}

/// Lifecycle of the single detail view
#[derive(Debug, Clone, Default)]
pub enum DetailState {
    #[default]
    Closed,
    Open(Box<DetailedView>),
}

impl DetailState {
    /// Replace whatever is open with `view`
    pub fn open(&mut self, view: DetailedView) {
        *self = DetailState::Open(Box::new(view));
    }

    pub fn close(&mut self) {
        *self = DetailState::Closed;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, DetailState::Open(_))
    }

    #[must_use]
    pub fn view(&self) -> Option<&DetailedView> {
        match self {
            DetailState::Open(view) => Some(view),
            DetailState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(tid: u32, ts: Micros) -> Event {
        Event::new(EventKind::IdleOut, ts).with_value(f64::from(tid))
    }

    fn idle(ts: Micros) -> Event {
        Event::new(EventKind::IdleIn, ts)
    }

    fn cores() -> Vec<Arc<[Event]>> {
        vec![
            Arc::from(vec![out(10, 100), out(11, 300), idle(500)]),
            Arc::from(vec![out(10, 400), idle(600), out(12, 700), out(0, 800)]),
        ]
    }

    #[test]
    fn test_reconstruct_full_window() {
        let threads = reconstruct_threads(&cores(), 0, 1_000);
        assert_eq!(threads[&Tid(10)].total, 400);
        assert_eq!(threads[&Tid(11)].total, 200);
        assert_eq!(threads[&Tid(12)].total, 100, "zero id means idle");
        assert_eq!(
            threads[&Tid(10)].events,
            vec![out(10, 100), idle(300), out(10, 400), idle(600)]
        );
    }

    #[test]
    fn test_reconstruct_clips_to_window() {
        let threads = reconstruct_threads(&cores(), 200, 450);
        assert_eq!(threads[&Tid(10)].total, 150);
        assert_eq!(threads[&Tid(11)].total, 150);
        assert!(!threads.contains_key(&Tid(12)));
        assert_eq!(threads[&Tid(10)].events[0], out(10, 200));
    }

    #[test]
    fn test_totals_match_intervals() {
        for (min, max) in [(0, 1_000), (150, 650), (350, 360)] {
            for intervals in reconstruct_threads(&cores(), min, max).values() {
                let summed: Micros =
                    intervals.events.chunks(2).map(|pair| pair[1].timestamp - pair[0].timestamp).sum();
                assert_eq!(summed, intervals.total);
            }
        }
    }

    #[test]
    fn test_window_respects_min_width() {
        let parent = LayoutParams { min_timestamp: 0, max_timestamp: 1_000, resolution: 10.0, label_width: 0.0 };
        let narrow = DetailParams { zoom_factor: 8.0, min_width: 640.0 };
        // content width 100 < 640: 640 * 10 / 8 / 2 = 400
        assert_eq!(narrow.window(&parent, 500), (100, 900));
        let wide = DetailParams { zoom_factor: 2.0, min_width: 10.0 };
        assert_eq!(wide.window(&parent, 500), (250, 750));
    }

    #[test]
    fn test_group_by_process_sorted() {
        let model = TraceModel::from_json_str(
            r#"{"system": {"threads": {
                "10": {"pid": 10, "name": "app"},
                "11": {"pid": 10, "name": "RenderThread"}
            }}}"#,
        )
        .unwrap();
        let processes = group_by_process(&model, reconstruct_threads(&cores(), 0, 1_000));

        assert_eq!(processes.len(), 2);
        assert_eq!(processes[0].name, "app");
        assert_eq!(processes[0].total, 600);
        let names: Vec<_> = processes[0].threads.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["app", "RenderThread"]);
        assert_eq!(processes[1].pid, Pid(0));
        assert_eq!(processes[1].name, "unknown");
    }

    #[test]
    fn test_detail_state_lifecycle() {
        let model = TraceModel::from_json_str(r#"{"duration": 1000}"#).unwrap();
        let parent = LayoutParams { min_timestamp: 0, max_timestamp: 1_000, resolution: 1.0, label_width: 0.0 };
        let config = ViewConfig::svg(1_000);

        let mut state = DetailState::default();
        assert!(!state.is_open());
        state.open(DetailedView::build(&model, &parent, &config, 500, Some(0)));
        assert_eq!(state.view().map(|v| v.center), Some(500));
        state.open(DetailedView::build(&model, &parent, &config, 700, Some(1)));
        assert_eq!(state.view().and_then(|v| v.core), Some(1));
        state.close();
        assert!(state.view().is_none());
    }
}
