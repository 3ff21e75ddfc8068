use arcscope::app::{App, ClickOutcome};
use arcscope::config::ViewConfig;
use arcscope::domain::Micros;
use arcscope::export::render_svg;
use arcscope::interaction::{HitTarget, Pointer, TooltipContent};
use arcscope::layout::BandRole;

const FIXTURE: &str = "tests/fixtures/simple_model.json";

fn app() -> App {
    let mut app = App::new(ViewConfig::svg(1000));
    app.load_file(FIXTURE.as_ref()).expect("Failed to load fixture");
    app
}

/// Pointer over band `index` at `timestamp`
fn over_band(app: &App, index: usize, timestamp: Micros) -> Pointer {
    let layout = app.overview().unwrap();
    let band = &layout.bands()[index];
    Pointer::at(layout.x_for(timestamp), (band.top + band.bottom) / 2.0)
}

#[test]
fn test_overview_sections() {
    let app = app();
    let layout = app.overview().unwrap();

    // cpu 0, cpu 1, chrome, android, one view buffer
    let roles: Vec<BandRole> = layout.bands().iter().map(|b| b.role).collect();
    assert_eq!(roles.len(), 5);
    assert_eq!(roles[0], BandRole::Cpu(0));
    assert_eq!(roles[1], BandRole::Cpu(1));
    assert!(roles[2..].iter().all(|r| *r == BandRole::Plain));

    // Memory and Frequency have samples; the rest are skipped
    assert_eq!(layout.charts().len(), 2);
    assert_eq!(layout.charts()[0].sources.len(), 2);

    let texts: Vec<&str> = layout.scene().texts().collect();
    assert!(texts.contains(&"CPU"));
    assert!(texts.contains(&"Chrome"));
    assert!(texts.contains(&"Android"));
    assert!(texts.contains(&"Game - MainActivity"));
    assert!(layout.vsync().is_some());
}

#[test]
fn test_sequence_tooltip_with_vsync_offset() {
    let mut app = app();
    let pointer = over_band(&app, 2, 4200);
    let tooltip = app.pointer_moved(pointer).expect("tooltip over chrome band");

    assert_eq!(tooltip.target, HitTarget::Band(2));
    assert!(matches!(tooltip.content, TooltipContent::Sequence(_)));
    let lines = tooltip.lines();
    assert!(lines.contains(&"draw 0.500ms -> swap".to_string()), "{lines:?}");
    assert_eq!(tooltip.since_vsync, Some(3200));
}

#[test]
fn test_global_mark_wins_near_cursor() {
    let mut app = app();
    let pointer = over_band(&app, 4, 11050);
    let tooltip = app.pointer_moved(pointer).unwrap();
    match &tooltip.content {
        TooltipContent::Global { name, timestamp, value } => {
            assert_eq!(*name, "custom event");
            assert_eq!(*timestamp, 11000);
            assert_eq!(value.as_deref(), Some("level loaded"));
        }
        other => panic!("expected global mark, got {other:?}"),
    }
}

#[test]
fn test_chart_tooltip_interpolates() {
    let mut app = app();
    let layout = app.overview().unwrap();
    let chart = &layout.charts()[0];
    let pointer = Pointer::at(layout.x_for(5000), (chart.top + chart.bottom) / 2.0);

    let tooltip = app.pointer_moved(pointer).unwrap();
    let TooltipContent::Chart(values) = &tooltip.content else {
        panic!("expected chart values");
    };
    let used = values.iter().find(|v| v.name == "used memory").unwrap();
    assert!((used.value - 1536.0).abs() < 1e-9);
}

#[test]
fn test_cpu_click_opens_detail_grouped_by_process() {
    let mut app = app();
    let pointer = over_band(&app, 0, 5000);
    assert_eq!(app.click(pointer), ClickOutcome::DetailOpened);

    let view = app.detail().unwrap();
    assert_eq!(view.center, 5000);
    assert_eq!(view.core, Some(0));

    // 1000px at 20us/px zoomed 8x: 1250us either side
    let params = view.layout().params();
    assert_eq!((params.min_timestamp, params.max_timestamp), (3750, 6250));

    let names: Vec<&str> = view.processes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["surfaceflinger", "chrome"]);
    let surfaceflinger = &view.processes[0];
    assert_eq!(surfaceflinger.total, 2500);
    assert_eq!(surfaceflinger.threads[0].name, "RenderEngine");
    assert_eq!(surfaceflinger.threads[0].total, 2250);
    assert_eq!(view.processes[1].threads[0].total, 2250);

    assert!(view.layout().bands().iter().all(|b| matches!(b.role, BandRole::Thread(_))));
}

#[test]
fn test_svg_has_one_rect_per_band_span() {
    let app = app();
    let layout = app.overview().unwrap();

    // Chrome buffer: draw, swap, wait for ack, presentation done, then swap done ends it
    let chrome = &layout.bands()[2];
    let chrome_spans = layout.scene().rects().filter(|(_, y, _, _, _)| (*y - chrome.top).abs() < 1e-9).count();
    assert_eq!(chrome_spans, 4);

    let svg = render_svg(layout).expect("Failed to render SVG");
    assert!(svg.contains("Game - MainActivity"));
    // One rect per span, plus the background
    assert_eq!(svg.matches("<rect").count(), layout.scene().rects().count() + 1);
}
