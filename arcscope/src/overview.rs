//! Overview layout of a whole model
//!
//! Section order, top to bottom:
//!
//! ```text
//! time ruler
//! CPU 0..n              one band per core, clickable for the detail view
//! counter charts        memory, swap, GEM, frequency, temperature, power
//! Chrome                one band per buffer, marks as globals
//! Android               SurfaceFlinger buffers, vsync and marks as globals
//! <task> - <activity>   buffer queue bands per view, marks as globals
//! ```

use arcscope_common::{
    EventKind, BUFFER_QUEUE_RANGE, CHROME_RANGE, CPU_RANGE, GLOBAL_MARK_RANGE, MARK_RANGE,
    SURFACE_FLINGER_RANGE, VSYNC_RANGE,
};
use log::info;
use std::sync::Arc;

use crate::config::ViewConfig;
use crate::layout::{ruler_step, BandLayout, BandRole, LayoutParams};
use crate::sequence::SequenceClassifier;
use crate::series::EventSeries;
use crate::trace_model::{Event, TraceModel, ViewModel};

/// A counter chart and the kinds plotted on it
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    pub title: &'static str,
    pub kinds: &'static [EventKind],
}

/// Counter charts in display order; kinds sharing a chart share its axis
pub const COUNTER_CHARTS: &[ChartSpec] = &[
    ChartSpec { title: "Memory", kinds: &[EventKind::MemUsed, EventKind::MemTotal] },
    ChartSpec { title: "Swap", kinds: &[EventKind::SwapRead, EventKind::SwapWrite] },
    ChartSpec { title: "Swap wait", kinds: &[EventKind::SwapWait] },
    ChartSpec { title: "GEM objects", kinds: &[EventKind::GemObjects] },
    ChartSpec { title: "GEM size", kinds: &[EventKind::GemSize] },
    ChartSpec { title: "Frequency", kinds: &[EventKind::CpuFrequency, EventKind::GpuFrequency] },
    ChartSpec { title: "Temperature", kinds: &[EventKind::CpuTemperature] },
    ChartSpec {
        title: "Power",
        kinds: &[
            EventKind::CpuPower,
            EventKind::GpuPower,
            EventKind::MemoryPower,
            EventKind::PackagePowerConstraint,
        ],
    },
];

/// Lay out every channel of `model` over `params`.
#[must_use]
pub fn build_overview(model: &TraceModel, params: LayoutParams, config: &ViewConfig) -> BandLayout {
    let mut layout = BandLayout::new(params, SequenceClassifier::default()).with_font_size(config.font_size);
    let span = params.max_timestamp - params.min_timestamp;

    layout.add_time_ruler(config.ruler_height, ruler_step(span, 10));

    // CPU
    if !model.system.cpu.is_empty() {
        layout.add_title("CPU", config.title_height);
        for (core, events) in model.system.cpu.iter().enumerate() {
            layout.add_label(&format!("CPU {core}"));
            layout.add_band_with_role(
                EventSeries::with_range(Arc::clone(events), CPU_RANGE),
                config.band_height,
                config.band_padding,
                BandRole::Cpu(core),
            );
        }
    }

    add_counter_charts(&mut layout, &model.system.memory, config);

    // Chrome
    if !model.chrome.buffers.is_empty() {
        layout.add_band_separator(config.separator_padding);
        layout.add_title("Chrome", config.title_height);
        add_buffers(&mut layout, &model.chrome.buffers, CHROME_RANGE, config);
    }
    layout.add_global(EventSeries::with_range(Arc::clone(&model.chrome.global_events), MARK_RANGE));

    // Android
    if !model.android.buffers.is_empty() {
        layout.add_band_separator(config.separator_padding);
        layout.add_title("Android", config.title_height);
        add_buffers(&mut layout, &model.android.buffers, SURFACE_FLINGER_RANGE, config);
    }
    layout.set_vsync(EventSeries::with_range(Arc::clone(&model.android.global_events), VSYNC_RANGE));
    layout.add_global(EventSeries::with_range(
        Arc::clone(&model.android.global_events),
        GLOBAL_MARK_RANGE,
    ));

    for view in &model.views {
        layout.add_band_separator(config.separator_padding);
        layout.add_title(&view_title(model, view), config.title_height);
        add_buffers(&mut layout, &view.buffers, BUFFER_QUEUE_RANGE, config);
        layout.add_global(EventSeries::with_range(Arc::clone(&view.global_events), MARK_RANGE));
    }

    info!(
        "Built overview: {} bands, {} charts, {} global series",
        layout.bands().len(),
        layout.charts().len(),
        layout.globals().len()
    );
    layout
}

fn add_buffers(layout: &mut BandLayout, buffers: &[Arc<[Event]>], range: (u32, u32), config: &ViewConfig) {
    for (index, events) in buffers.iter().enumerate() {
        layout.add_label(&format!("buffer {index}"));
        layout.add_band(
            EventSeries::with_range(Arc::clone(events), range),
            config.band_height,
            config.band_padding,
        );
    }
}

fn add_counter_charts(layout: &mut BandLayout, memory: &Arc<[Event]>, config: &ViewConfig) {
    for spec in COUNTER_CHARTS {
        let sources: Vec<EventSeries> = spec
            .kinds
            .iter()
            .filter(|kind| memory.iter().any(|e| e.kind == **kind))
            .map(|kind| EventSeries::new(Arc::clone(memory), kind.code(), kind.code()))
            .collect();
        if sources.is_empty() {
            continue;
        }
        layout.add_label(spec.title);
        let chart = layout.add_chart(config.chart_height, config.chart_padding);
        layout.add_chart_sources(chart, sources);
    }
}

/// Section title of a view: task title and activity
#[must_use]
pub fn view_title(model: &TraceModel, view: &ViewModel) -> String {
    match model.task(view.task_id) {
        Some(task) => format!("{} - {}", task.title, view.activity),
        None => format!("task {} - {}", view.task_id, view.activity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "duration": 10000,
        "android": {
            "buffers": [[[400, 1000], [403, 1100], [404, 1500]]],
            "global_events": [[400, 1000], [405, 1600], [400, 17666]]
        },
        "chrome": {
            "buffers": [[[500, 2000], [501, 2500], [504, 3000]], [[200, 100], [204, 300]]],
            "global_events": [[505, 4000]]
        },
        "system": {
            "cpu": [[[1, 0, 42], [0, 5000]], [[0, 0]]],
            "memory": [[10001, 0, 100], [10000, 0, 400], [10001, 5000, 200], [10008, 6000, 45]],
            "threads": {}
        },
        "views": [{"task_id": 3, "activity": "Main", "buffers": [[[100, 10], [103, 20]]], "global_events": []}],
        "tasks": {"3": {"title": "Game"}}
    }"#;

    fn overview() -> BandLayout {
        let model = TraceModel::from_json_str(MODEL).unwrap();
        let config = ViewConfig::svg(1000);
        build_overview(&model, config.layout_params(0, model.duration), &config)
    }

    #[test]
    fn test_sections_in_order() {
        let layout = overview();
        let roles: Vec<BandRole> = layout.bands().iter().map(|b| b.role).collect();
        assert_eq!(
            roles,
            vec![
                BandRole::Cpu(0),
                BandRole::Cpu(1),
                BandRole::Plain,
                BandRole::Plain,
                BandRole::Plain,
                BandRole::Plain
            ]
        );
        assert_eq!(layout.bands()[2].series.type_range(), CHROME_RANGE);
        assert_eq!(layout.bands()[4].series.type_range(), SURFACE_FLINGER_RANGE);
        assert_eq!(layout.bands()[5].series.type_range(), BUFFER_QUEUE_RANGE);

        let tops: Vec<f64> = layout.bands().iter().map(|b| b.top).collect();
        assert!(tops.windows(2).all(|w| w[0] < w[1]), "bands stack downwards");
    }

    #[test]
    fn test_only_present_counters_get_charts() {
        let layout = overview();
        assert_eq!(layout.charts().len(), 2, "memory and temperature");
        let names: Vec<_> = layout.charts()[0].sources.iter().map(|s| s.attributes.name).collect();
        assert_eq!(names, vec!["used memory", "total memory"]);
    }

    #[test]
    fn test_globals_and_vsync() {
        let layout = overview();
        let vsync = layout.vsync().unwrap();
        assert_eq!(vsync.type_range(), VSYNC_RANGE);
        // chrome marks, vsync, android marks, one view
        assert_eq!(layout.globals().len(), 4);
    }

    #[test]
    fn test_view_titles() {
        let layout = overview();
        assert!(layout.scene().texts().any(|t| t == "Game - Main"));
        assert!(layout.scene().texts().any(|t| t == "CPU 1"));
    }
}
